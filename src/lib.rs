//! `scholar-federation` — a scholarly-literature federation engine.
//!
//! Given a free-text query, the [`Orchestrator`] fans out to ~8 heterogeneous
//! bibliographic sources (PubMed, Semantic Scholar, OpenAlex, arXiv,
//! CrossRef, CORE, BASE, Europe PMC), normalizes every response into a
//! single [`Paper`] model, discovers additional records by walking citation
//! edges, deduplicates across sources, scores each record's reliability
//! from a multi-factor rubric, and ranks by a blended
//! relevance/reliability/recency function. A [`ProgressEvent`] stream lets
//! a caller surface per-source state to a UI while a search is in flight.
//!
//! The HTTP surface that exposes this to clients, process-environment
//! loading, and logging initialization are deliberately left to the
//! embedding application — this crate is the federation core only.

pub mod config;
pub mod error;
pub mod http_client;
pub mod model;
pub mod orchestrator;
pub mod progress;
pub mod providers;
pub mod rate_limiter;
pub mod reliability;
pub mod resilience;
pub mod text;

pub use config::Settings;
pub use error::{Error, ErrorCategory, Result};
pub use model::{AccessType, Author, Paper, ReliabilityLevel, ReliabilityScore, SourceType};
pub use orchestrator::{
    AccessCounts, Orchestrator, OrchestratorConfig, ReliabilityCounts, SearchResult, Timeline,
};
pub use progress::{Phase, ProgressEvent, ProgressSender, ProgressStatus};
pub use providers::{AdapterConfig, SourceAdapter};
pub use rate_limiter::RateLimiter;
pub use resilience::{CircuitBreaker, RetryConfig, RetryPolicy, TimeoutConfig, TimeoutExt};
