//! Europe PMC adapter, grounded on
//! `original_source/backend/adapters/europe_pmc.py`. Upstream paginates
//! via a cursor mark rather than offset/limit; this adapter follows the
//! cursor until it stops advancing or the page limit is reached.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::http_client::HttpClient;
use crate::model::{AccessType, Author, Paper, SourceType};
use crate::providers::traits::{AdapterConfig, SourceAdapter};

const BASE_URL: &str = "https://www.ebi.ac.uk/europepmc/webservices/rest/search";
const PAGE_SIZE: u32 = 100;

pub struct EuropePmcAdapter {
    client: HttpClient,
}

impl EuropePmcAdapter {
    pub fn new(_config: AdapterConfig) -> Result<Self> {
        let client = HttpClient::new("scholar-federation/0.1", 10.0)?;
        Ok(Self { client })
    }

    async fn fetch_page(&self, query: &str, cursor: &str, page_size: u32) -> Result<SearchResponse> {
        let encoded = urlencoding::encode(query);
        let url = format!(
            "{BASE_URL}?query={encoded}&format=json&pageSize={page_size}&cursorMark={cursor}"
        );
        let response = self.client.get(&url).await?;
        crate::http_client::json(response, "europe pmc search").await
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(rename = "nextCursorMark")]
    next_cursor_mark: Option<String>,
    #[serde(rename = "resultList")]
    result_list: ResultList,
}

#[derive(Deserialize)]
struct ResultList {
    #[serde(default)]
    result: Vec<RawResult>,
}

#[derive(Deserialize)]
struct RawResult {
    title: Option<String>,
    #[serde(rename = "authorString")]
    author_string: Option<String>,
    #[serde(rename = "pubYear")]
    pub_year: Option<String>,
    #[serde(rename = "journalTitle")]
    journal_title: Option<String>,
    doi: Option<String>,
    pmid: Option<String>,
    pmcid: Option<String>,
    #[serde(rename = "abstractText")]
    abstract_text: Option<String>,
    #[serde(rename = "pubType")]
    pub_type: Option<String>,
    #[serde(rename = "isOpenAccess")]
    is_open_access: Option<String>,
    #[serde(rename = "citedByCount")]
    cited_by_count: Option<u64>,
}

fn to_paper(raw: RawResult) -> Option<Paper> {
    let id = raw.pmcid.clone().or_else(|| raw.pmid.clone())?;
    let title = raw.title.unwrap_or_else(|| "Unknown".to_string());
    let mut paper = Paper::new(format!("europmc_{id}"), title, "Europe PMC");

    paper.doi = raw.doi;
    paper.pmid = raw.pmid;
    paper.pmcid = raw.pmcid.clone();
    paper.journal = raw.journal_title;
    paper.year = raw.pub_year.and_then(|y| y.parse().ok());
    paper.abstract_text = raw.abstract_text;
    paper.citation_count = raw.cited_by_count.unwrap_or(0);

    paper.authors = raw
        .author_string
        .map(|s| s.split(',').map(|name| Author::new(name.trim())).collect())
        .unwrap_or_default();

    paper.source_type = if raw.pub_type.as_deref() == Some("preprint") {
        SourceType::Preprint
    } else {
        SourceType::PeerReviewed
    };

    paper.access_type = if raw.is_open_access.as_deref() == Some("Y") {
        AccessType::Open
    } else {
        AccessType::Unknown
    };

    if let Some(pmcid) = raw.pmcid {
        paper.pdf_url = Some(format!(
            "https://europepmc.org/articles/{pmcid}?pdf=render"
        ));
    }

    Some(paper)
}

#[async_trait]
impl SourceAdapter for EuropePmcAdapter {
    fn name(&self) -> &str {
        "Europe PMC"
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<Paper>> {
        if query.trim().is_empty() {
            return Err(Error::InvalidInput { field: "query".to_string(), reason: "must not be empty".to_string() });
        }
        let mut papers = Vec::new();
        let mut cursor = "*".to_string();
        loop {
            let page_size = PAGE_SIZE.min(limit.saturating_sub(papers.len() as u32).max(1));
            let page = self.fetch_page(query, &cursor, page_size).await?;
            papers.extend(page.result_list.result.into_iter().filter_map(to_paper));

            match page.next_cursor_mark {
                Some(next) if next != cursor && (papers.len() as u32) < limit => cursor = next,
                _ => break,
            }
        }
        papers.truncate(limit as usize);
        Ok(papers)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Paper>> {
        if id.trim().is_empty() {
            return Err(Error::InvalidInput { field: "id".to_string(), reason: "must not be empty".to_string() });
        }
        let trimmed = id.trim_start_matches("europmc_");
        let page = self.fetch_page(&format!("ext_id:{trimmed}"), "*", 1).await?;
        Ok(page.result_list.result.into_iter().filter_map(to_paper).next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pub_type: Option<&str>, is_oa: Option<&str>) -> RawResult {
        RawResult {
            title: Some("T".to_string()),
            author_string: Some("Doe J, Smith A".to_string()),
            pub_year: Some("2020".to_string()),
            journal_title: None,
            doi: None,
            pmid: Some("123".to_string()),
            pmcid: Some("PMC999".to_string()),
            abstract_text: None,
            pub_type: pub_type.map(str::to_string),
            is_open_access: is_oa.map(str::to_string),
            cited_by_count: None,
        }
    }

    #[test]
    fn prefers_pmcid_as_id() {
        let paper = to_paper(raw(None, None)).expect("paper");
        assert_eq!(paper.id, "europmc_PMC999");
    }

    #[test]
    fn preprint_pub_type_maps_to_preprint() {
        let paper = to_paper(raw(Some("preprint"), None)).expect("paper");
        assert_eq!(paper.source_type, SourceType::Preprint);
    }

    #[test]
    fn other_pub_type_defaults_to_peer_reviewed() {
        let paper = to_paper(raw(Some("research-article"), None)).expect("paper");
        assert_eq!(paper.source_type, SourceType::PeerReviewed);
    }

    #[test]
    fn open_access_flag_y_maps_to_open() {
        let paper = to_paper(raw(None, Some("Y"))).expect("paper");
        assert_eq!(paper.access_type, AccessType::Open);
        assert!(paper.pdf_url.is_some());
    }

    #[test]
    fn author_string_splits_on_comma() {
        let paper = to_paper(raw(None, None)).expect("paper");
        assert_eq!(paper.authors.len(), 2);
        assert_eq!(paper.authors[0].name, "Doe J");
    }
}
