use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Reliability band derived from [`ReliabilityScore::total`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReliabilityLevel {
    High,
    Medium,
    Low,
}

impl ReliabilityLevel {
    /// Color code used by UI consumers (green/yellow/red).
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            ReliabilityLevel::High => "green",
            ReliabilityLevel::Medium => "yellow",
            ReliabilityLevel::Low => "red",
        }
    }
}

/// Whether a full text copy is freely reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessType {
    Open,
    Paywalled,
    #[default]
    Unknown,
}

/// The kind of document a source reported, driving the `peerReview`
/// component of reliability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceType {
    PeerReviewed,
    Preprint,
    Conference,
    Thesis,
    BookChapter,
    GreyLiterature,
    #[default]
    Unknown,
}

/// A single author credit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
    /// Bare ORCID identifier, URL prefix already stripped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orcid: Option<String>,
}

impl Author {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            affiliation: None,
            orcid: None,
        }
    }

    #[must_use]
    pub fn with_orcid(mut self, orcid: impl Into<String>) -> Self {
        self.orcid = Some(orcid.into());
        self
    }
}

/// Multi-factor reliability assessment. Components sum to at most 1.0;
/// a retraction overrides the total to 0 regardless of components.
///
/// See `SPEC_FULL.md` §3 for the exact tier tables used by
/// [`crate::reliability::calculate_reliability`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityScore {
    pub peer_review: f64,
    pub journal: f64,
    pub citations: f64,
    pub verification: f64,
    pub recency: f64,
    pub is_retracted: bool,
    pub contradictions: Vec<String>,
}

impl ReliabilityScore {
    /// Sum of components, penalized by contradictions and clamped to
    /// `[0, 1]`; zero outright when retracted.
    #[must_use]
    pub fn total(&self) -> f64 {
        if self.is_retracted {
            return 0.0;
        }
        let base = self.peer_review + self.journal + self.citations + self.verification + self.recency;
        let penalty = self.contradictions.len() as f64 * 0.05;
        (base - penalty).clamp(0.0, 1.0)
    }

    #[must_use]
    pub fn level(&self) -> ReliabilityLevel {
        let score = self.total();
        if score >= 0.8 {
            ReliabilityLevel::High
        } else if score >= 0.5 {
            ReliabilityLevel::Medium
        } else {
            ReliabilityLevel::Low
        }
    }

    #[must_use]
    pub fn color(&self) -> &'static str {
        self.level().color()
    }

    /// Render into the `reliability` sub-object shape fixed by §6:
    /// `{score, color, level, components: {...}, isRetracted, contradictions}`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "score": round3(self.total()),
            "color": self.color(),
            "level": match self.level() {
                ReliabilityLevel::High => "high",
                ReliabilityLevel::Medium => "medium",
                ReliabilityLevel::Low => "low",
            },
            "components": {
                "peerReview": round3(self.peer_review),
                "journal": round3(self.journal),
                "citations": round3(self.citations),
                "verification": round3(self.verification),
                "recency": round3(self.recency),
            },
            "isRetracted": self.is_retracted,
            "contradictions": self.contradictions,
        })
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Normalized bibliographic record. Created by an adapter from one upstream
/// record, then owned by the aggregated list and mutated only by merge
/// (§4.4 phase 3) and the scoring passes (reliability, relevance, access).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    /// Opaque, source-prefixed id (e.g. `"pubmed_12345"`). Unique per
    /// source, not globally.
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<Author>,

    pub year: Option<u32>,
    pub journal: Option<String>,
    pub publisher: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub pages: Option<String>,

    pub doi: Option<String>,
    pub pmid: Option<String>,
    pub pmcid: Option<String>,
    pub arxiv_id: Option<String>,

    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,

    #[serde(default)]
    pub citation_count: u64,
    #[serde(default)]
    pub reference_count: u64,

    #[serde(default)]
    pub access_type: AccessType,
    pub pdf_url: Option<String>,
    pub html_url: Option<String>,

    pub source: String,
    #[serde(default)]
    pub source_type: SourceType,
    /// Adapter display names that returned this record, order-preserving.
    /// Never empty once a paper has left an adapter (invariant I2).
    #[serde(default)]
    pub sources_found_in: Vec<String>,

    #[serde(default)]
    pub reliability: ReliabilityScore,

    #[serde(default)]
    pub urls: HashMap<String, String>,

    #[serde(default)]
    pub relevance_score: f64,
}

impl Paper {
    /// Construct a bare paper with the fields every adapter must set
    /// immediately: id, title, originating source, and that source's name
    /// recorded as the sole entry of `sourcesFoundIn`.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        Self {
            id: id.into(),
            title: title.into(),
            authors: Vec::new(),
            year: None,
            journal: None,
            publisher: None,
            volume: None,
            issue: None,
            pages: None,
            doi: None,
            pmid: None,
            pmcid: None,
            arxiv_id: None,
            abstract_text: None,
            keywords: Vec::new(),
            citation_count: 0,
            reference_count: 0,
            access_type: AccessType::Unknown,
            pdf_url: None,
            html_url: None,
            sources_found_in: vec![source.clone()],
            source,
            source_type: SourceType::Unknown,
            reliability: ReliabilityScore::default(),
            urls: HashMap::new(),
            relevance_score: 0.0,
        }
    }

    #[must_use]
    pub fn author_names(&self) -> Vec<&str> {
        self.authors.iter().map(|a| a.name.as_str()).collect()
    }

    /// First three author names joined with `", "`, or `"<first> et al."`
    /// beyond three, or `"Unknown"` with none.
    #[must_use]
    pub fn author_string(&self) -> String {
        let names = self.author_names();
        match names.len() {
            0 => "Unknown".to_string(),
            1..=3 => names.join(", "),
            _ => format!("{} et al.", names[..3].join(", ")),
        }
    }

    #[must_use]
    pub fn reliability_score(&self) -> f64 {
        self.reliability.total()
    }

    /// Render the full `§4.6`/`§6` serialization shape, including the
    /// derived `authorString` and the `reliability` sub-object, neither of
    /// which round-trips through plain `serde_json::to_value`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}));
        if let Some(obj) = value.as_object_mut() {
            obj.insert("authorString".to_string(), serde_json::json!(self.author_string()));
            obj.insert("reliability".to_string(), self.reliability.to_json());
            obj.insert(
                "relevanceScore".to_string(),
                serde_json::json!(round3(self.relevance_score)),
            );
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_string_handles_band_sizes() {
        let mut paper = Paper::new("x_1", "Title", "X");
        assert_eq!(paper.author_string(), "Unknown");

        paper.authors = vec![Author::new("A"), Author::new("B")];
        assert_eq!(paper.author_string(), "A, B");

        paper.authors = vec![
            Author::new("A"),
            Author::new("B"),
            Author::new("C"),
            Author::new("D"),
        ];
        assert_eq!(paper.author_string(), "A, B, C et al.");
    }

    #[test]
    fn retraction_overrides_total() {
        let mut score = ReliabilityScore {
            peer_review: 0.30,
            journal: 0.20,
            citations: 0.20,
            verification: 0.20,
            recency: 0.10,
            ..ReliabilityScore::default()
        };
        assert!((score.total() - 1.0).abs() < f64::EPSILON);

        score.is_retracted = true;
        assert_eq!(score.total(), 0.0);
        assert_eq!(score.level(), ReliabilityLevel::Low);
        assert_eq!(score.color(), "red");
    }

    #[test]
    fn contradictions_penalize_and_clamp() {
        let score = ReliabilityScore {
            peer_review: 0.30,
            journal: 0.20,
            citations: 0.20,
            verification: 0.20,
            recency: 0.10,
            contradictions: vec!["a".into(), "b".into(), "c".into()],
            ..ReliabilityScore::default()
        };
        // 1.0 - 0.15 = 0.85
        assert!((score.total() - 0.85).abs() < 1e-9);
    }

    #[test]
    fn new_paper_starts_with_itself_in_sources_found_in() {
        let paper = Paper::new("pubmed_1", "Title", "PubMed");
        assert_eq!(paper.sources_found_in, vec!["PubMed".to_string()]);
    }
}
