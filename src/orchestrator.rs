//! The federation core: fan-out, citation expansion, dedup-and-merge,
//! reliability re-scoring, relevance ranking, filters, and aggregate stats
//! (§4.4). Grounded on the reference implementation's
//! `SearchOrchestrator.search` and on this codebase's existing
//! `MetaSearchClient` for the concurrency idiom (bounded semaphore,
//! one `tokio::spawn` per adapter, joined and folded in registration
//! order).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::model::{AccessType, Paper, ReliabilityLevel, SourceType};
use crate::progress::{emit, Phase, ProgressEvent, ProgressSender, ProgressStatus};
use crate::providers::{
    AdapterConfig, ArxivAdapter, BaseAdapter, CoreAdapter, CrossRefAdapter, EuropePmcAdapter,
    OpenAlexAdapter, PubMedAdapter, SemanticScholarAdapter, SourceAdapter, UnpaywallAdapter,
};
use crate::reliability::{calculate_reliability, current_year, ReliabilityContext};
use crate::text;

/// Phase-2 citation expansion works over this many top-cited records
/// (§4.4 phase 2).
const CITATION_EXPANSION_CANDIDATES: usize = 20;
/// Citations/references kept per expanded record (§4.4 phase 2).
const CITATION_EXPANSION_PER_PAPER: usize = 5;

/// Per-search knobs (§4.4), all with the named defaults.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub max_per_source: u32,
    pub expand_citations: bool,
    /// Reserved; current semantics are always a single hop (§4.4).
    pub citation_depth: u32,
    pub include_preprints: bool,
    pub min_reliability: f64,
    pub year_start: Option<u32>,
    pub year_end: Option<u32>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_per_source: 100,
            expand_citations: true,
            citation_depth: 1,
            include_preprints: true,
            min_reliability: 0.0,
            year_start: None,
            year_end: None,
        }
    }
}

/// Reliability-band counts across the final ranked list.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ReliabilityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// Access-type counts across the final ranked list (Unknown is counted in
/// neither, per §8's `open + paywalled <= totalFound`).
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct AccessCounts {
    pub open: usize,
    pub paywalled: usize,
}

/// Earliest/latest publication year across papers that have one.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Timeline {
    pub earliest: Option<u32>,
    pub latest: Option<u32>,
}

/// The unified result of one `Orchestrator::search` call (§4.6).
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub query: String,
    pub papers: Vec<Paper>,
    pub total_found: usize,
    pub sources_searched: Vec<String>,
    pub duplicates_removed: usize,
    pub search_time_seconds: f64,
    pub reliability: ReliabilityCounts,
    pub access: AccessCounts,
    pub timeline: Timeline,
}

impl SearchResult {
    /// Render the `§4.6`/`§6` serialization shape: camelCase outer keys,
    /// papers rendered through [`Paper::to_json`] so the derived
    /// `authorString` and `reliability` sub-object are present.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "query": self.query,
            "papers": self.papers.iter().map(Paper::to_json).collect::<Vec<_>>(),
            "totalFound": self.total_found,
            "sourcesSearched": self.sources_searched,
            "duplicatesRemoved": self.duplicates_removed,
            "searchTimeSeconds": self.search_time_seconds,
            "reliability": {
                "high": self.reliability.high,
                "medium": self.reliability.medium,
                "low": self.reliability.low,
            },
            "access": {
                "open": self.access.open,
                "paywalled": self.access.paywalled,
            },
            "timeline": {
                "earliest": self.timeline.earliest,
                "latest": self.timeline.latest,
            },
        })
    }
}

/// The orchestration core (§4.4). Holds one `Arc`-shareable adapter per
/// source, constructed once and reused across searches (§9's "global
/// orchestrator lifecycle" belongs to the out-of-scope HTTP layer; this
/// struct only needs to support being built once and shared).
pub struct Orchestrator {
    /// Fan-out adapters, in the registration order that is also the
    /// canonical merge-iteration order (§4.4 phase 1, §5): PubMed,
    /// Semantic Scholar, OpenAlex, arXiv, CrossRef, CORE, BASE, Europe PMC.
    adapters: Vec<Arc<dyn SourceAdapter>>,
    /// Unpaywall never joins the fan-out (§4.3: it has no search
    /// endpoint); it is held separately for the enrichment probe (§4.5).
    unpaywall: Arc<UnpaywallAdapter>,
}

impl Orchestrator {
    /// Build the default adapter set from a populated [`Settings`]. The
    /// orchestrator never touches `std::env` itself (§9) — `settings` is
    /// expected to have been loaded by the caller.
    pub fn new(settings: &Settings) -> Result<Self> {
        let email = settings.email_or_default();

        let pubmed = PubMedAdapter::new(
            AdapterConfig::new("PubMed", 3.0)
                .with_api_key(settings.ncbi_api_key.clone())
                .with_email(Some(email.clone())),
        )?;
        let semantic_scholar = SemanticScholarAdapter::new(
            AdapterConfig::new("Semantic Scholar", 0.33)
                .with_api_key(settings.semantic_scholar_key.clone()),
        )?;
        let openalex = OpenAlexAdapter::new(
            AdapterConfig::new("OpenAlex", 10.0).with_email(Some(email.clone())),
        )?;
        let arxiv = ArxivAdapter::new(AdapterConfig::new("arXiv", 1.0))?;
        let crossref = CrossRefAdapter::new(
            AdapterConfig::new("CrossRef", 50.0).with_email(Some(email.clone())),
        )?;
        let core = CoreAdapter::new(AdapterConfig::new("CORE", 10.0))?;
        let base = BaseAdapter::new(AdapterConfig::new("BASE", 1.0))?;
        let europe_pmc = EuropePmcAdapter::new(AdapterConfig::new("Europe PMC", 10.0))?;
        let unpaywall =
            UnpaywallAdapter::new(AdapterConfig::new("Unpaywall", 10.0).with_email(Some(email)))?;

        Ok(Self {
            adapters: vec![
                Arc::new(pubmed),
                Arc::new(semantic_scholar),
                Arc::new(openalex),
                Arc::new(arxiv),
                Arc::new(crossref),
                Arc::new(core),
                Arc::new(base),
                Arc::new(europe_pmc),
            ],
            unpaywall: Arc::new(unpaywall),
        })
    }

    /// Build an orchestrator over an arbitrary adapter set (mock adapters
    /// in tests, a subset of sources, or a reordered registration).
    #[must_use]
    pub fn from_adapters(adapters: Vec<Arc<dyn SourceAdapter>>, unpaywall: Arc<UnpaywallAdapter>) -> Self {
        Self { adapters, unpaywall }
    }

    /// Run the open-access enrichment probe against one paper (§4.5). Not
    /// wired into the default pipeline; callable directly by whatever
    /// caller wants it.
    pub async fn enrich(&self, paper: &mut Paper) {
        self.unpaywall.enrich(paper).await;
    }

    /// The full search pipeline (§4.4), with no progress stream.
    pub async fn search(&self, query: &str, config: OrchestratorConfig) -> Result<SearchResult> {
        self.search_with_progress(query, config, None).await
    }

    /// The full search pipeline (§4.4), optionally streaming
    /// [`ProgressEvent`]s to `progress` as each phase and adapter call
    /// starts/completes/errors.
    pub async fn search_with_progress(
        &self,
        query: &str,
        config: OrchestratorConfig,
        progress: Option<ProgressSender>,
    ) -> Result<SearchResult> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::EmptyQuery);
        }
        let start = Instant::now();
        let progress = progress.as_ref();

        let (mut aggregated, sources_searched) = self.fan_out(query, config.max_per_source, progress).await;

        if config.expand_citations {
            self.expand_citations(&mut aggregated, progress).await;
        }

        emit(
            progress,
            ProgressEvent::phase_boundary(Phase::Process, ProgressStatus::Running, "deduplicating and scoring"),
        );
        let total_before_dedup = aggregated.len();
        let (mut papers, duplicates_removed) = dedup_and_merge(aggregated);
        info!(
            before = total_before_dedup,
            after = papers.len(),
            duplicates_removed,
            "deduplication complete"
        );

        rescore_reliability(&mut papers);
        rank_by_relevance(&mut papers, query);
        apply_filters(&mut papers, &config);

        emit(
            progress,
            ProgressEvent::phase_boundary(Phase::Process, ProgressStatus::Complete, format!("{} papers", papers.len())),
        );

        let stats = aggregate_stats(&papers);
        let search_time_seconds = (start.elapsed().as_secs_f64() * 100.0).round() / 100.0;

        emit(
            progress,
            ProgressEvent::phase_boundary(Phase::Complete, ProgressStatus::Complete, format!("{} results", papers.len())),
        );

        Ok(SearchResult {
            query: query.to_string(),
            total_found: papers.len(),
            papers,
            sources_searched,
            duplicates_removed,
            search_time_seconds,
            reliability: stats.0,
            access: stats.1,
            timeline: stats.2,
        })
    }

    /// Phase 1 (§4.4, §5): one `tokio::spawn` per adapter gated by a
    /// semaphore sized to the adapter count, joined and folded back in
    /// registration order so merge behavior stays deterministic across
    /// runs. Adapter failures are recorded via `progress` and otherwise
    /// absorbed — they never fail the overall search.
    async fn fan_out(
        &self,
        query: &str,
        max_per_source: u32,
        progress: Option<&ProgressSender>,
    ) -> (Vec<Paper>, Vec<String>) {
        emit(
            progress,
            ProgressEvent::phase_boundary(Phase::Search, ProgressStatus::Running, "fanning out to adapters"),
        );

        let semaphore = Arc::new(Semaphore::new(self.adapters.len().max(1)));
        let mut tasks = Vec::with_capacity(self.adapters.len());
        for adapter in &self.adapters {
            let adapter = Arc::clone(adapter);
            let query = query.to_string();
            let semaphore = Arc::clone(&semaphore);
            let name = adapter.name().to_string();
            emit(
                progress,
                ProgressEvent::adapter(Phase::Search, name.clone(), ProgressStatus::Running, None, None),
            );
            tasks.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                (name, adapter.search(&query, max_per_source).await)
            }));
        }

        let mut aggregated = Vec::new();
        let mut sources_searched = Vec::new();
        for task in tasks {
            match task.await {
                Ok((name, Ok(papers))) => {
                    emit(
                        progress,
                        ProgressEvent::adapter(
                            Phase::Search,
                            name.clone(),
                            ProgressStatus::Complete,
                            Some(papers.len()),
                            None,
                        ),
                    );
                    sources_searched.push(name);
                    aggregated.extend(papers);
                }
                Ok((name, Err(err))) => {
                    warn!(adapter = name, error = %err, "adapter search failed");
                    emit(
                        progress,
                        ProgressEvent::adapter(
                            Phase::Search,
                            name,
                            ProgressStatus::Error,
                            None,
                            Some(err.to_string()),
                        ),
                    );
                }
                Err(join_err) => {
                    warn!(error = %join_err, "adapter task panicked");
                }
            }
        }

        emit(
            progress,
            ProgressEvent::phase_boundary(
                Phase::Search,
                ProgressStatus::Complete,
                format!("{} adapters succeeded", sources_searched.len()),
            ),
        );

        (aggregated, sources_searched)
    }

    /// Phase 2 (§4.4): expand the top 20 most-cited records (zero-citation
    /// filtered first) through the one citation-capable adapter. Failures
    /// on individual records do not abort the phase.
    async fn expand_citations(&self, aggregated: &mut Vec<Paper>, progress: Option<&ProgressSender>) {
        let Some(citation_adapter) = self.adapters.iter().find(|a| a.supports_citations()) else {
            return;
        };

        emit(
            progress,
            ProgressEvent::phase_boundary(Phase::Citations, ProgressStatus::Running, "expanding citation graph"),
        );

        let mut candidates: Vec<&Paper> = aggregated.iter().filter(|p| p.citation_count > 0).collect();
        candidates.sort_by(|a, b| b.citation_count.cmp(&a.citation_count));
        let top: Vec<Paper> = candidates
            .into_iter()
            .take(CITATION_EXPANSION_CANDIDATES)
            .cloned()
            .collect();

        let mut expanded = Vec::new();
        for paper in &top {
            match citation_adapter
                .get_citations(paper, CITATION_EXPANSION_PER_PAPER as u32)
                .await
            {
                Ok(mut citing) => {
                    citing.truncate(CITATION_EXPANSION_PER_PAPER);
                    expanded.extend(citing);
                }
                Err(err) => warn!(paper = %paper.id, error = %err, "citation expansion failed"),
            }
            match citation_adapter
                .get_references(paper, CITATION_EXPANSION_PER_PAPER as u32)
                .await
            {
                Ok(mut references) => {
                    references.truncate(CITATION_EXPANSION_PER_PAPER);
                    expanded.extend(references);
                }
                Err(err) => warn!(paper = %paper.id, error = %err, "reference expansion failed"),
            }
        }

        emit(
            progress,
            ProgressEvent::phase_boundary(
                Phase::Citations,
                ProgressStatus::Complete,
                format!("{} papers added", expanded.len()),
            ),
        );
        aggregated.extend(expanded);
    }
}

/// Benchmark-only access to pipeline internals that otherwise stay private
/// to this module.
#[doc(hidden)]
pub mod bench_support {
    pub use super::dedup_and_merge;
}

/// Phase 3 (§4.4): walk papers in arrival order, probing DOI → PMID →
/// arXiv id → normalized title in that priority order. A paper merges on
/// the first key that hits; a miss inserts it into every applicable map.
pub fn dedup_and_merge(papers: Vec<Paper>) -> (Vec<Paper>, usize) {
    let mut unique: Vec<Paper> = Vec::with_capacity(papers.len());
    let mut by_doi: HashMap<String, usize> = HashMap::new();
    let mut by_pmid: HashMap<String, usize> = HashMap::new();
    let mut by_arxiv: HashMap<String, usize> = HashMap::new();
    let mut by_title: HashMap<String, usize> = HashMap::new();
    let mut duplicates = 0usize;

    for paper in papers {
        let doi_key = paper.doi.as_ref().map(|d| d.trim().to_lowercase());
        let pmid_key = paper.pmid.as_ref().map(|p| p.trim().to_string());
        let arxiv_key = paper.arxiv_id.as_ref().map(|a| a.trim().to_lowercase());
        let title_key = text::normalize_title(&paper.title);

        let hit = doi_key
            .as_ref()
            .and_then(|k| by_doi.get(k).copied())
            .or_else(|| pmid_key.as_ref().and_then(|k| by_pmid.get(k).copied()))
            .or_else(|| arxiv_key.as_ref().and_then(|k| by_arxiv.get(k).copied()))
            .or_else(|| by_title.get(&title_key).copied());

        match hit {
            Some(idx) => {
                duplicates += 1;
                merge_into(&mut unique[idx], paper);
            }
            None => {
                let idx = unique.len();
                if let Some(key) = doi_key {
                    by_doi.entry(key).or_insert(idx);
                }
                if let Some(key) = pmid_key {
                    by_pmid.entry(key).or_insert(idx);
                }
                if let Some(key) = arxiv_key {
                    by_arxiv.entry(key).or_insert(idx);
                }
                by_title.entry(title_key).or_insert(idx);
                unique.push(paper);
            }
        }
    }

    (unique, duplicates)
}

/// The merge rules of §4.4 phase 3, in order.
fn merge_into(target: &mut Paper, source: Paper) {
    for name in source.sources_found_in {
        if !target.sources_found_in.contains(&name) {
            target.sources_found_in.push(name);
        }
    }

    target.citation_count = target.citation_count.max(source.citation_count);

    if target.doi.is_none() {
        target.doi = source.doi.clone();
    }
    if target.pmid.is_none() {
        target.pmid = source.pmid.clone();
    }
    if target.arxiv_id.is_none() {
        target.arxiv_id = source.arxiv_id.clone();
    }
    if target.abstract_text.is_none() {
        target.abstract_text = source.abstract_text.clone();
    }

    for keyword in source.keywords {
        if !target.keywords.contains(&keyword) {
            target.keywords.push(keyword);
        }
    }
    target.keywords.truncate(10);

    for (role, url) in source.urls {
        target.urls.insert(role, url);
    }

    if source.access_type == AccessType::Open {
        target.access_type = AccessType::Open;
        if let Some(pdf_url) = source.pdf_url {
            target.pdf_url = Some(pdf_url);
        }
    }
}

/// Phase 4 (§4.4): recompute reliability now that merge has settled
/// `sources_found_in`, so cross-source verification counts.
fn rescore_reliability(papers: &mut [Paper]) {
    for paper in papers.iter_mut() {
        let ctx = ReliabilityContext {
            is_peer_reviewed: paper.source_type == SourceType::PeerReviewed,
            journal_name: paper.journal.clone(),
            citation_count: paper.citation_count,
            sources_found: paper.sources_found_in.len(),
            year: paper.year,
            is_retracted: paper.reliability.is_retracted,
        };
        let contradictions = std::mem::take(&mut paper.reliability.contradictions);
        let mut score = calculate_reliability(paper, &ctx);
        score.contradictions = contradictions;
        paper.reliability = score;
    }
}

/// Phase 5 (§4.4): title/abstract overlap against the normalized query,
/// plus citation/reliability/recency/open-access terms. Sorts descending.
fn rank_by_relevance(papers: &mut [Paper], query: &str) {
    let query_terms = text::term_set(query);
    let query_len = query_terms.len().max(1) as f64;
    let year_now = current_year();

    for paper in papers.iter_mut() {
        let title_terms = text::term_set(&paper.title);
        let title_overlap = title_terms.intersection(&query_terms).count() as f64 / query_len * 30.0;

        let abstract_score = paper
            .abstract_text
            .as_deref()
            .map(|text| {
                let abstract_terms = text::term_set(text);
                (abstract_terms.intersection(&query_terms).count() as f64 * 3.0).min(15.0)
            })
            .unwrap_or(0.0);

        let citation_score = if paper.citation_count > 0 {
            (((paper.citation_count as f64) + 1.0).log10() * 5.0).min(20.0)
        } else {
            0.0
        };

        let reliability_score = paper.reliability.total() * 20.0;

        let recency_score = match paper.year {
            Some(year) => match year_now - i64::from(year) as i32 {
                age if age <= 2 => 10.0,
                age if age <= 5 => 7.0,
                age if age <= 10 => 4.0,
                _ => 1.0,
            },
            None => 0.0,
        };

        let open_access_bonus = if paper.access_type == AccessType::Open { 5.0 } else { 0.0 };

        paper.relevance_score =
            title_overlap + abstract_score + citation_score + reliability_score + recency_score + open_access_bonus;
    }

    papers.sort_by(|a, b| {
        b.relevance_score
            .partial_cmp(&a.relevance_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Phase 6 (§4.4), applied in order: year range, `minReliability`,
/// preprint exclusion.
fn apply_filters(papers: &mut Vec<Paper>, config: &OrchestratorConfig) {
    if config.year_start.is_some() || config.year_end.is_some() {
        papers.retain(|paper| match paper.year {
            None => false,
            Some(year) => {
                config.year_start.map_or(true, |start| year >= start)
                    && config.year_end.map_or(true, |end| year <= end)
            }
        });
    }

    if config.min_reliability > 0.0 {
        papers.retain(|paper| paper.reliability.total() >= config.min_reliability);
    }

    if !config.include_preprints {
        papers.retain(|paper| paper.source_type != SourceType::Preprint);
    }
}

/// Phase 7 (§4.4): band/access counts and the publication-year timeline.
fn aggregate_stats(papers: &[Paper]) -> (ReliabilityCounts, AccessCounts, Timeline) {
    let mut reliability = ReliabilityCounts::default();
    let mut access = AccessCounts::default();
    let mut timeline = Timeline::default();

    for paper in papers {
        match paper.reliability.level() {
            ReliabilityLevel::High => reliability.high += 1,
            ReliabilityLevel::Medium => reliability.medium += 1,
            ReliabilityLevel::Low => reliability.low += 1,
        }
        match paper.access_type {
            AccessType::Open => access.open += 1,
            AccessType::Paywalled => access.paywalled += 1,
            AccessType::Unknown => {}
        }
        if let Some(year) = paper.year {
            timeline.earliest = Some(timeline.earliest.map_or(year, |e| e.min(year)));
            timeline.latest = Some(timeline.latest.map_or(year, |l| l.max(year)));
        }
    }

    (reliability, access, timeline)
}
