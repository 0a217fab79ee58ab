//! Semantic Scholar adapter: the only source with citation-graph walks,
//! grounded on `original_source/backend/adapters/semantic_scholar.py`.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::http_client::HttpClient;
use crate::model::{Author, Paper, SourceType};
use crate::providers::traits::{AdapterConfig, SourceAdapter};

const BASE_URL: &str = "https://api.semanticscholar.org/graph/v1";
const FIELDS: &str = "title,abstract,year,authors,venue,publicationVenue,externalIds,\
citationCount,referenceCount,openAccessPdf,publicationTypes,fieldsOfStudy";

pub struct SemanticScholarAdapter {
    client: HttpClient,
    config: AdapterConfig,
}

impl SemanticScholarAdapter {
    pub fn new(config: AdapterConfig) -> Result<Self> {
        let rate = if config.api_key.is_some() { 1.0 } else { 0.33 };
        let client = HttpClient::new("scholar-federation/0.1", rate)?;
        Ok(Self { client, config })
    }

    fn auth_header(&self) -> Option<(&str, &str)> {
        self.config.api_key.as_deref().map(|key| ("x-api-key", key))
    }

    async fn fetch<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        let response = match self.auth_header() {
            Some(header) => self.client.get_with_header(url, header).await?,
            None => self.client.get(url).await?,
        };
        crate::http_client::json(response, "semantic scholar").await
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<RawPaper>,
}

#[derive(Deserialize)]
struct CitationsResponse {
    #[serde(default)]
    data: Vec<CitationEnvelope>,
}

#[derive(Deserialize)]
struct CitationEnvelope {
    #[serde(rename = "citingPaper", alias = "citedPaper")]
    paper: Option<RawPaper>,
}

#[derive(Deserialize, Default)]
struct RawPaper {
    #[serde(rename = "paperId")]
    paper_id: Option<String>,
    title: Option<String>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    year: Option<u32>,
    #[serde(default)]
    authors: Vec<RawAuthor>,
    venue: Option<String>,
    #[serde(rename = "publicationVenue")]
    publication_venue: Option<PublicationVenue>,
    #[serde(rename = "externalIds", default)]
    external_ids: ExternalIds,
    #[serde(rename = "citationCount", default)]
    citation_count: u64,
    #[serde(rename = "referenceCount", default)]
    reference_count: u64,
    #[serde(rename = "openAccessPdf")]
    open_access_pdf: Option<OpenAccessPdf>,
    #[serde(rename = "publicationTypes", default)]
    publication_types: Vec<String>,
    #[serde(rename = "fieldsOfStudy", default)]
    fields_of_study: Vec<String>,
}

#[derive(Deserialize)]
struct RawAuthor {
    name: Option<String>,
}

#[derive(Deserialize)]
struct PublicationVenue {
    name: Option<String>,
}

#[derive(Deserialize, Default)]
struct ExternalIds {
    #[serde(rename = "DOI")]
    doi: Option<String>,
    #[serde(rename = "PubMed")]
    pubmed: Option<String>,
    #[serde(rename = "ArXiv")]
    arxiv: Option<String>,
}

#[derive(Deserialize)]
struct OpenAccessPdf {
    url: Option<String>,
}

fn to_paper(raw: RawPaper) -> Option<Paper> {
    let paper_id = raw.paper_id?;
    let title = raw.title.unwrap_or_else(|| "Unknown".to_string());
    let mut paper = Paper::new(format!("s2_{paper_id}"), title, "Semantic Scholar");

    paper.abstract_text = raw.abstract_text;
    paper.year = raw.year;
    paper.authors = raw
        .authors
        .into_iter()
        .filter_map(|a| a.name)
        .map(Author::new)
        .collect();
    paper.journal = raw
        .publication_venue
        .and_then(|v| v.name)
        .or(raw.venue);
    paper.doi = raw.external_ids.doi;
    paper.pmid = raw.external_ids.pubmed;
    paper.arxiv_id = raw.external_ids.arxiv.clone();
    paper.citation_count = raw.citation_count;
    paper.reference_count = raw.reference_count;
    paper.keywords = raw.fields_of_study;

    if let Some(pdf) = raw.open_access_pdf {
        paper.pdf_url = pdf.url;
        if paper.pdf_url.is_some() {
            paper.access_type = crate::model::AccessType::Open;
        }
    }

    let types = &raw.publication_types;
    paper.source_type = if types.iter().any(|t| t == "Preprint") || raw.external_ids.arxiv.is_some() {
        SourceType::Preprint
    } else if types.iter().any(|t| t == "Conference") {
        SourceType::Conference
    } else {
        SourceType::PeerReviewed
    };

    Some(paper)
}

#[async_trait]
impl SourceAdapter for SemanticScholarAdapter {
    fn name(&self) -> &str {
        "Semantic Scholar"
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<Paper>> {
        if query.trim().is_empty() {
            return Err(Error::InvalidInput { field: "query".to_string(), reason: "must not be empty".to_string() });
        }
        let encoded = urlencoding::encode(query);
        let url = format!(
            "{BASE_URL}/paper/search?query={encoded}&limit={limit}&fields={FIELDS}"
        );
        let response: SearchResponse = self.fetch(&url).await?;
        Ok(response.data.into_iter().filter_map(to_paper).collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Paper>> {
        if id.trim().is_empty() {
            return Err(Error::InvalidInput { field: "id".to_string(), reason: "must not be empty".to_string() });
        }
        let trimmed = id.trim_start_matches("s2_");
        let url = format!("{BASE_URL}/paper/{trimmed}?fields={FIELDS}");
        let raw: RawPaper = self.fetch(&url).await?;
        Ok(to_paper(raw))
    }

    async fn get_citations(&self, paper: &Paper, limit: u32) -> Result<Vec<Paper>> {
        let trimmed = paper.id.trim_start_matches("s2_");
        let url = format!(
            "{BASE_URL}/paper/{trimmed}/citations?limit={limit}&fields={FIELDS}"
        );
        let response: CitationsResponse = self.fetch(&url).await?;
        Ok(response.data.into_iter().filter_map(|e| e.paper).filter_map(to_paper).collect())
    }

    async fn get_references(&self, paper: &Paper, limit: u32) -> Result<Vec<Paper>> {
        let trimmed = paper.id.trim_start_matches("s2_");
        let url = format!(
            "{BASE_URL}/paper/{trimmed}/references?limit={limit}&fields={FIELDS}"
        );
        let response: CitationsResponse = self.fetch(&url).await?;
        Ok(response.data.into_iter().filter_map(|e| e.paper).filter_map(to_paper).collect())
    }

    fn supports_citations(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preprint_detected_via_arxiv_id_even_without_publication_type() {
        let raw = RawPaper {
            paper_id: Some("abc".to_string()),
            title: Some("Title".to_string()),
            external_ids: ExternalIds {
                arxiv: Some("2301.00001".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let paper = to_paper(raw).expect("paper");
        assert_eq!(paper.source_type, SourceType::Preprint);
    }

    #[test]
    fn venue_prefers_publication_venue_over_bare_venue() {
        let raw = RawPaper {
            paper_id: Some("abc".to_string()),
            title: Some("Title".to_string()),
            venue: Some("Some Conf Proceedings".to_string()),
            publication_venue: Some(PublicationVenue {
                name: Some("Nature".to_string()),
            }),
            ..Default::default()
        };
        let paper = to_paper(raw).expect("paper");
        assert_eq!(paper.journal.as_deref(), Some("Nature"));
    }

    #[test]
    fn open_access_pdf_sets_open_access_type() {
        let raw = RawPaper {
            paper_id: Some("abc".to_string()),
            title: Some("Title".to_string()),
            open_access_pdf: Some(OpenAccessPdf {
                url: Some("https://example.com/paper.pdf".to_string()),
            }),
            ..Default::default()
        };
        let paper = to_paper(raw).expect("paper");
        assert_eq!(paper.access_type, crate::model::AccessType::Open);
        assert_eq!(paper.pdf_url.as_deref(), Some("https://example.com/paper.pdf"));
    }
}
