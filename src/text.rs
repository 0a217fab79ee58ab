//! Small text-normalization helpers shared by the dedup key, the relevance
//! scorer, and a couple of adapters that scavenge structured data out of
//! free text (§3, §4.3, §4.4).

use std::sync::OnceLock;

use regex::Regex;

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "of", "in", "on", "for", "to", "with",
];

/// Lowercase, strip everything but alphanumerics and whitespace, collapse
/// whitespace, drop stopwords, rejoin. Used both as the title half of the
/// dedup key and as the term set for relevance overlap scoring.
///
/// Grounded on the reference implementation's `_normalize_title`.
#[must_use]
pub fn normalize_title(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();

    stripped
        .split_whitespace()
        .filter(|word| !STOPWORDS.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// The term set used for relevance overlap scoring (§4.4 phase 5): the
/// same normalization pipeline as [`normalize_title`], split on
/// whitespace. Shared by the query, a candidate's title, and its abstract
/// so overlap counts compare like with like.
#[must_use]
pub fn term_set(text: &str) -> std::collections::HashSet<String> {
    normalize_title(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn doi_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"10\.\d{4,9}/\S+").expect("static DOI pattern"))
}

/// Scavenge a bare DOI out of free text (BASE's `dc:identifier` fields can
/// carry a DOI buried in a URL or citation string rather than as its own
/// field).
#[must_use]
pub fn scavenge_doi(text: &str) -> Option<String> {
    doi_regex().find(text).map(|m| m.as_str().trim_end_matches(['.', ',', ')']).to_string())
}

fn jats_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("static tag pattern"))
}

/// Strip JATS/XML markup CrossRef and others embed in abstracts
/// (`<jats:p>...</jats:p>`), leaving plain text.
#[must_use]
pub fn strip_tags(text: &str) -> String {
    jats_tag_regex().replace_all(text, "").trim().to_string()
}

fn arxiv_new_style_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{4}\.\d{4,5}(v\d+)?").expect("static arxiv new-style pattern"))
}

fn arxiv_old_style_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[a-z-]+/\d{7}(v\d+)?").expect("static arxiv old-style pattern"))
}

/// Extract an arXiv id (new `2301.12345` or old `hep-th/9901001` style)
/// from an arbitrary string such as an Atom `<id>` URL, dropping any
/// version suffix (`v2`, …).
#[must_use]
pub fn extract_arxiv_id(text: &str) -> Option<String> {
    let found = arxiv_new_style_regex()
        .find(text)
        .or_else(|| arxiv_old_style_regex().find(text))?
        .as_str();
    Some(match found.rfind('v') {
        Some(pos) if found[pos + 1..].chars().all(|c| c.is_ascii_digit()) && !found[pos + 1..].is_empty() => {
            found[..pos].to_string()
        }
        _ => found.to_string(),
    })
}
