//! The adapter contract every bibliographic source implements (§4.3).
//!
//! Grounded on the reference implementation's `BaseAdapter`/`AdapterConfig`
//! and the Rust teacher's `SourceProvider` trait: a name, a config, a
//! `search`, an optional `get_by_id`, and default empty-success citation
//! walks for the sources that don't support them.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::Paper;

/// Per-adapter construction parameters. Mirrors the reference
/// implementation's `AdapterConfig` dataclass.
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    pub name: String,
    pub requests_per_second: f64,
    pub api_key: Option<String>,
    pub email: Option<String>,
    pub base_url: Option<String>,
}

impl AdapterConfig {
    #[must_use]
    pub fn new(name: impl Into<String>, requests_per_second: f64) -> Self {
        Self {
            name: name.into(),
            requests_per_second,
            api_key: None,
            email: None,
            base_url: None,
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    #[must_use]
    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }
}

/// One bibliographic source: search, direct lookup, and (for the one
/// source that supports it) citation-graph walks. Stateless beyond its
/// HTTP client and config — safe to share across concurrent searches via
/// `Arc<dyn SourceAdapter>`.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Display name recorded in `Paper::sources_found_in` and progress
    /// events (e.g. `"PubMed"`, `"Semantic Scholar"`).
    fn name(&self) -> &str;

    /// Free-text query, capped by the orchestrator at a reasonable result
    /// count per source. Adapters must never panic on a malformed upstream
    /// response; absorb what they can and skip the rest (§4.3 edge cases).
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<Paper>>;

    /// Direct lookup by whatever identifier this source accepts (DOI,
    /// PMID, arXiv id, internal id). Returns `Ok(None)` when the source
    /// doesn't support direct lookup or the id isn't found, rather than an
    /// error (BASE never supports this, per its adapter).
    async fn get_by_id(&self, id: &str) -> Result<Option<Paper>>;

    /// Papers citing `paper`. Empty by default — only Semantic Scholar
    /// overrides this (§4.3/§4.4 phase 2).
    async fn get_citations(&self, _paper: &Paper, _limit: u32) -> Result<Vec<Paper>> {
        Ok(Vec::new())
    }

    /// Papers referenced by `paper`. Empty by default, same as
    /// [`get_citations`](Self::get_citations).
    async fn get_references(&self, _paper: &Paper, _limit: u32) -> Result<Vec<Paper>> {
        Ok(Vec::new())
    }

    /// Whether this adapter implements citation-graph walks. Lets the
    /// orchestrator pick an expansion source without downcasting.
    fn supports_citations(&self) -> bool {
        false
    }
}
