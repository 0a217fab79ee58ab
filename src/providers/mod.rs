//! One module per bibliographic source, all implementing [`traits::SourceAdapter`].
//! Registration order here is the order the orchestrator fans out and folds
//! results back in (§4.4 phase 1).

pub mod arxiv;
pub mod base_search;
pub mod core_ac;
pub mod crossref;
pub mod europe_pmc;
pub mod openalex;
pub mod pubmed;
pub mod semantic_scholar;
pub mod traits;
pub mod unpaywall;

pub use arxiv::ArxivAdapter;
pub use base_search::BaseAdapter;
pub use core_ac::CoreAdapter;
pub use crossref::CrossRefAdapter;
pub use europe_pmc::EuropePmcAdapter;
pub use openalex::OpenAlexAdapter;
pub use pubmed::PubMedAdapter;
pub use semantic_scholar::SemanticScholarAdapter;
pub use traits::{AdapterConfig, SourceAdapter};
pub use unpaywall::UnpaywallAdapter;
