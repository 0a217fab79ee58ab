//! CORE adapter, grounded on
//! `original_source/backend/adapters/core_ac.py`. Requires an API key sent
//! as a bearer token.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::http_client::HttpClient;
use crate::model::{AccessType, Author, Paper, SourceType};
use crate::providers::traits::{AdapterConfig, SourceAdapter};

const BASE_URL: &str = "https://api.core.ac.uk/v3/search/works";
const PAGE_SIZE: u32 = 25;

pub struct CoreAdapter {
    client: HttpClient,
    api_key: Option<String>,
}

impl CoreAdapter {
    pub fn new(config: AdapterConfig) -> Result<Self> {
        let client = HttpClient::new("scholar-federation/0.1", 10.0)?;
        Ok(Self {
            client,
            api_key: config.api_key,
        })
    }

    async fn fetch(&self, url: &str) -> Result<SearchResponse> {
        let response = match &self.api_key {
            Some(key) => {
                let header = format!("Bearer {key}");
                self.client.get_with_header(url, ("Authorization", &header)).await?
            }
            None => self.client.get(url).await?,
        };
        crate::http_client::json(response, "core search").await
    }

    /// Page by offset until `limit` is reached, a batch returns fewer
    /// records than requested, or a batch beyond the first errors (§4.3).
    async fn search_paged(&self, query: &str, limit: u32) -> Result<Vec<Paper>> {
        let encoded = urlencoding::encode(query);
        let mut papers = Vec::new();
        let mut offset = 0u32;
        loop {
            let page_size = PAGE_SIZE.min(limit.saturating_sub(papers.len() as u32));
            if page_size == 0 {
                break;
            }
            let url = format!("{BASE_URL}?q={encoded}&limit={page_size}&offset={offset}");
            match self.fetch(&url).await {
                Ok(body) => {
                    let batch_len = body.results.len() as u32;
                    papers.extend(body.results.into_iter().filter_map(to_paper));
                    if batch_len < page_size || papers.len() as u32 >= limit {
                        break;
                    }
                    offset += page_size;
                }
                Err(_) if offset > 0 => return Ok(papers.into_iter().take(limit as usize).collect()),
                Err(err) => return Err(err),
            }
        }
        papers.truncate(limit as usize);
        Ok(papers)
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<RawWork>,
}

#[derive(Deserialize)]
struct RawWork {
    id: Option<serde_json::Value>,
    title: Option<String>,
    #[serde(rename = "yearPublished")]
    year_published: Option<u32>,
    #[serde(default)]
    authors: Vec<RawAuthor>,
    #[serde(rename = "documentType")]
    document_type: Option<String>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    #[serde(rename = "downloadUrl")]
    download_url: Option<String>,
    doi: Option<String>,
}

#[derive(Deserialize)]
struct RawAuthor {
    name: Option<String>,
}

fn map_document_type(document_type: Option<&str>) -> SourceType {
    let lowered = document_type.unwrap_or_default().to_lowercase();
    if lowered.contains("article") || lowered.contains("journal") {
        SourceType::PeerReviewed
    } else if lowered.contains("thesis") {
        SourceType::Thesis
    } else if lowered.contains("conference") {
        SourceType::Conference
    } else {
        SourceType::Unknown
    }
}

fn to_paper(raw: RawWork) -> Option<Paper> {
    let id = raw.id.map(|v| v.to_string().trim_matches('"').to_string())?;
    let title = raw.title.unwrap_or_else(|| "Unknown".to_string());
    let mut paper = Paper::new(format!("core_{id}"), title, "CORE");

    paper.year = raw.year_published;
    paper.doi = raw.doi;
    paper.abstract_text = raw.abstract_text;
    paper.source_type = map_document_type(raw.document_type.as_deref());
    paper.authors = raw.authors.into_iter().filter_map(|a| a.name).map(Author::new).collect();

    if let Some(download_url) = raw.download_url {
        paper.pdf_url = Some(download_url);
        paper.access_type = AccessType::Open;
    } else {
        paper.access_type = AccessType::Unknown;
    }

    Some(paper)
}

#[async_trait]
impl SourceAdapter for CoreAdapter {
    fn name(&self) -> &str {
        "CORE"
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<Paper>> {
        if query.trim().is_empty() {
            return Err(Error::InvalidInput { field: "query".to_string(), reason: "must not be empty".to_string() });
        }
        self.search_paged(query, limit).await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Paper>> {
        if id.trim().is_empty() {
            return Err(Error::InvalidInput { field: "id".to_string(), reason: "must not be empty".to_string() });
        }
        let trimmed = id.trim_start_matches("core_");
        let url = format!("https://api.core.ac.uk/v3/works/{trimmed}");
        let response = match &self.api_key {
            Some(key) => {
                let header = format!("Bearer {key}");
                self.client.get_with_header(&url, ("Authorization", &header)).await?
            }
            None => self.client.get(&url).await?,
        };
        let raw: RawWork = crate::http_client::json(response, "core work").await?;
        Ok(to_paper(raw))
    }
}
