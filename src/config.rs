//! Typed settings surface for the federation core.
//!
//! Loading process environment into this struct is deliberately kept out of
//! the core (§1, §9 of the design notes): the orchestrator accepts a
//! [`Settings`] value by construction, the same way the reference
//! implementation's `SearchOrchestrator.__init__` takes `pubmed_key` /
//! `semantic_scholar_key` / `email` as plain arguments instead of reading
//! `os.environ` itself. [`Settings::from_env`] is provided as a convenience
//! for callers who do want to load from the process environment, built on
//! the `config` crate the way the rest of this codebase configures itself.

use serde::Deserialize;

/// Adapter API keys and contact details the orchestrator needs to reach
/// upstream sources at their best available rate tier.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// NCBI API key; raises the PubMed rate limit from 3req/s to 10req/s.
    pub ncbi_api_key: Option<String>,
    /// Semantic Scholar API key; raises the rate limit from 0.33req/s to 1req/s.
    pub semantic_scholar_key: Option<String>,
    /// Contact email sent to OpenAlex, CrossRef (polite pool), PubMed, and Unpaywall.
    pub search_email: Option<String>,
    /// Port for an external HTTP surface (out of core scope; carried through
    /// so the typed settings shape matches the environment inputs of §6).
    pub port: Option<u16>,
    /// Verbose logging toggle for an external entrypoint.
    pub debug: bool,
}

impl Settings {
    /// Load settings from process environment variables
    /// (`NCBI_API_KEY`, `SEMANTIC_SCHOLAR_KEY`, `SEARCH_EMAIL`, `PORT`, `DEBUG`).
    ///
    /// This is the one place in the crate that touches `std::env`, and it
    /// exists only as a convenience — nothing else in the core calls it.
    pub fn from_env() -> crate::error::Result<Self> {
        let loaded = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .try_parsing(true)
                    .prefix_separator("")
                    .separator("__"),
            )
            .build()?;

        Ok(Self {
            ncbi_api_key: loaded.get_string("ncbi_api_key").ok(),
            semantic_scholar_key: loaded.get_string("semantic_scholar_key").ok(),
            search_email: loaded.get_string("search_email").ok(),
            port: loaded.get_int("port").ok().map(|p| p as u16),
            debug: loaded.get_bool("debug").unwrap_or(false),
        })
    }

    /// Contact email to use when an upstream requires one, falling back to
    /// a generic placeholder rather than sending an empty string.
    #[must_use]
    pub fn email_or_default(&self) -> String {
        self.search_email
            .clone()
            .unwrap_or_else(|| "user@example.com".to_string())
    }
}
