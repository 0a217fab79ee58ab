//! Pure reliability scoring function, grounded on the reference
//! implementation's `calculate_reliability` and its high-impact-journal /
//! reputable-publisher tables (`SPEC_FULL.md` §3).

use std::sync::OnceLock;

use crate::model::{Paper, ReliabilityScore, SourceType};

fn high_impact_journals() -> &'static [&'static str] {
    &[
        "nature",
        "science",
        "cell",
        "the lancet",
        "new england journal of medicine",
        "jama",
        "bmj",
        "nature medicine",
        "nature genetics",
        "nature biotechnology",
        "nature communications",
        "proceedings of the national academy of sciences",
        "physical review letters",
        "journal of the american chemical society",
        "angewandte chemie",
        "chemical reviews",
        "chemical society reviews",
        "neuron",
        "immunity",
        "molecular cell",
    ]
}

fn reputable_publishers() -> &'static [&'static str] {
    &[
        "nature publishing group",
        "springer",
        "elsevier",
        "wiley",
        "cell press",
        "american chemical society",
        "royal society of chemistry",
        "ieee",
        "american physical society",
        "oxford university press",
        "cambridge university press",
        "plos",
        "frontiers",
        "bmc",
    ]
}

static CURRENT_YEAR: OnceLock<i32> = OnceLock::new();

/// The "current year" reliability and relevance recency tiers measure
/// against. Defaults to `chrono::Utc::now()` but can be pinned once (e.g. by
/// tests) via [`set_current_year_for_test`].
pub(crate) fn current_year() -> i32 {
    *CURRENT_YEAR.get_or_init(|| chrono::Utc::now().year_ce().1 as i32)
}

#[cfg(test)]
pub(crate) fn set_current_year_for_test(year: i32) {
    let _ = CURRENT_YEAR.set(year);
}

use chrono::Datelike;

/// Inputs observed about a paper at scoring time, separate from the `Paper`
/// itself because the orchestrator re-scores with updated `sources_found`
/// after merge (§4.4 phase 4) without re-deriving the other fields.
pub struct ReliabilityContext {
    pub is_peer_reviewed: bool,
    pub journal_name: Option<String>,
    pub citation_count: u64,
    pub sources_found: usize,
    pub year: Option<u32>,
    pub is_retracted: bool,
}

impl ReliabilityContext {
    /// Build a context from a freshly parsed paper, before it has been
    /// merged with anything (`sources_found = 1`).
    #[must_use]
    pub fn from_paper(paper: &Paper) -> Self {
        Self {
            is_peer_reviewed: paper.source_type == SourceType::PeerReviewed,
            journal_name: paper.journal.clone(),
            citation_count: paper.citation_count,
            sources_found: 1,
            year: paper.year,
            is_retracted: false,
        }
    }
}

/// Compute a [`ReliabilityScore`] from the tier tables in `SPEC_FULL.md` §3.
#[must_use]
pub fn calculate_reliability(paper: &Paper, ctx: &ReliabilityContext) -> ReliabilityScore {
    let mut score = ReliabilityScore::default();

    if ctx.is_retracted {
        score.is_retracted = true;
        return score;
    }

    score.peer_review = if ctx.is_peer_reviewed {
        0.30
    } else if paper.source_type == SourceType::Conference {
        0.20
    } else if paper.source_type == SourceType::Preprint {
        0.10
    } else {
        0.05
    };

    score.journal = match &ctx.journal_name {
        Some(journal) => {
            let journal_lower = journal.to_lowercase();
            if high_impact_journals().iter().any(|j| journal_lower.contains(j)) {
                0.20
            } else if paper
                .publisher
                .as_deref()
                .map(|p| reputable_publishers().contains(&p.to_lowercase().as_str()))
                .unwrap_or(false)
            {
                0.15
            } else {
                0.10
            }
        }
        None => 0.0,
    };

    score.citations = match ctx.citation_count {
        c if c >= 500 => 0.20,
        c if c >= 100 => 0.15,
        c if c >= 25 => 0.10,
        c if c >= 5 => 0.05,
        c if c >= 1 => 0.02,
        _ => 0.0,
    };

    score.verification = match ctx.sources_found {
        n if n >= 5 => 0.20,
        n if n >= 3 => 0.15,
        n if n >= 2 => 0.10,
        _ => 0.05,
    };

    score.recency = match ctx.year {
        Some(year) => {
            let age = current_year() - i64::from(year) as i32;
            if age <= 2 {
                0.10
            } else if age <= 5 {
                0.07
            } else if age <= 10 {
                0.04
            } else {
                0.02
            }
        }
        None => 0.0,
    };

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Paper;

    fn high_impact_paper() -> Paper {
        let mut paper = Paper::new("x_1", "Title", "X");
        paper.source_type = SourceType::PeerReviewed;
        paper.journal = Some("Nature".to_string());
        paper.citation_count = 150;
        paper.year = Some(current_year() as u32 - 1);
        paper
    }

    #[test]
    fn scenario_high_reliability_paper() {
        let paper = high_impact_paper();
        let ctx = ReliabilityContext {
            is_peer_reviewed: true,
            journal_name: paper.journal.clone(),
            citation_count: 150,
            sources_found: 3,
            year: paper.year,
            is_retracted: false,
        };
        let score = calculate_reliability(&paper, &ctx);
        assert!((score.peer_review - 0.30).abs() < 1e-9);
        assert!((score.journal - 0.20).abs() < 1e-9);
        assert!((score.citations - 0.15).abs() < 1e-9);
        assert!((score.verification - 0.15).abs() < 1e-9);
        assert!((score.recency - 0.10).abs() < 1e-9);
        assert!((score.total() - 0.90).abs() < 1e-9);
        assert_eq!(score.color(), "green");
    }

    #[test]
    fn retracted_paper_scores_zero_despite_perfect_components() {
        let paper = high_impact_paper();
        let ctx = ReliabilityContext {
            is_retracted: true,
            ..ReliabilityContext::from_paper(&paper)
        };
        let score = calculate_reliability(&paper, &ctx);
        assert_eq!(score.total(), 0.0);
        assert_eq!(score.color(), "red");
    }

    #[test]
    fn preprint_with_single_source_gets_floor_verification() {
        let mut paper = Paper::new("arxiv_1", "Title", "arXiv");
        paper.source_type = SourceType::Preprint;
        let ctx = ReliabilityContext::from_paper(&paper);
        let score = calculate_reliability(&paper, &ctx);
        assert!((score.peer_review - 0.10).abs() < 1e-9);
        // verification floor applies even at exactly 1 source.
        assert!((score.verification - 0.05).abs() < 1e-9);
    }

    #[test]
    fn absent_journal_scores_zero_not_floor() {
        let paper = Paper::new("x_1", "Title", "X");
        let ctx = ReliabilityContext::from_paper(&paper);
        let score = calculate_reliability(&paper, &ctx);
        assert_eq!(score.journal, 0.0);
    }
}
