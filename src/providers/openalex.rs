//! OpenAlex adapter, grounded on
//! `original_source/backend/adapters/openalex.py`.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::http_client::HttpClient;
use crate::model::{Author, Paper, SourceType};
use crate::providers::traits::{AdapterConfig, SourceAdapter};

const BASE_URL: &str = "https://api.openalex.org/works";

pub struct OpenAlexAdapter {
    client: HttpClient,
    email: Option<String>,
}

impl OpenAlexAdapter {
    pub fn new(config: AdapterConfig) -> Result<Self> {
        let client = HttpClient::new("scholar-federation/0.1", 10.0)?;
        Ok(Self {
            client,
            email: config.email,
        })
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<RawWork>,
}

#[derive(Deserialize)]
struct RawWork {
    id: Option<String>,
    title: Option<String>,
    publication_year: Option<u32>,
    #[serde(default)]
    authorships: Vec<Authorship>,
    primary_location: Option<PrimaryLocation>,
    doi: Option<String>,
    #[serde(rename = "type")]
    work_type: Option<String>,
    cited_by_count: Option<u64>,
    abstract_inverted_index: Option<HashMap<String, Vec<u32>>>,
    #[serde(default)]
    concepts: Vec<Concept>,
    ids: Option<ExternalIds>,
}

#[derive(Deserialize)]
struct Authorship {
    author: Option<RawAuthor>,
}

#[derive(Deserialize)]
struct RawAuthor {
    display_name: Option<String>,
    orcid: Option<String>,
}

#[derive(Deserialize)]
struct PrimaryLocation {
    source: Option<Source>,
    pdf_url: Option<String>,
    is_oa: Option<bool>,
}

#[derive(Deserialize)]
struct Source {
    display_name: Option<String>,
}

#[derive(Deserialize)]
struct Concept {
    display_name: Option<String>,
}

#[derive(Deserialize)]
struct ExternalIds {
    pmid: Option<String>,
}

fn reconstruct_abstract(index: &HashMap<String, Vec<u32>>) -> String {
    let mut positions: Vec<(u32, &str)> = index
        .iter()
        .flat_map(|(word, positions)| positions.iter().map(move |&pos| (pos, word.as_str())))
        .collect();
    positions.sort_by_key(|&(pos, _)| pos);
    positions.into_iter().map(|(_, word)| word).collect::<Vec<_>>().join(" ")
}

fn map_type(work_type: Option<&str>) -> SourceType {
    match work_type {
        Some("article") => SourceType::PeerReviewed,
        Some("book-chapter") => SourceType::BookChapter,
        Some("dissertation") => SourceType::Thesis,
        Some("preprint") => SourceType::Preprint,
        Some("proceedings-article") => SourceType::Conference,
        _ => SourceType::Unknown,
    }
}

fn strip_prefix(id: &str) -> String {
    id.trim_start_matches("https://orcid.org/")
        .trim_start_matches("https://pubmed.ncbi.nlm.nih.gov/")
        .trim_start_matches("https://doi.org/")
        .to_string()
}

fn to_paper(raw: RawWork) -> Option<Paper> {
    let openalex_id = raw.id?.rsplit('/').next()?.to_string();
    let title = raw.title.unwrap_or_else(|| "Unknown".to_string());
    let mut paper = Paper::new(format!("openalex_{openalex_id}"), title, "OpenAlex");

    paper.year = raw.publication_year;
    paper.doi = raw.doi.map(|d| strip_prefix(&d));
    paper.pmid = raw.ids.and_then(|ids| ids.pmid).map(|p| strip_prefix(&p));
    paper.citation_count = raw.cited_by_count.unwrap_or(0);
    paper.source_type = map_type(raw.work_type.as_deref());

    paper.authors = raw
        .authorships
        .into_iter()
        .filter_map(|a| a.author)
        .filter_map(|author| {
            author.display_name.map(|name| {
                let mut built = Author::new(name);
                if let Some(orcid) = author.orcid {
                    built = built.with_orcid(strip_prefix(&orcid));
                }
                built
            })
        })
        .collect();

    if let Some(location) = raw.primary_location {
        paper.journal = location.source.and_then(|s| s.display_name);
        paper.pdf_url = location.pdf_url;
        if location.is_oa.unwrap_or(false) {
            paper.access_type = crate::model::AccessType::Open;
        }
    }

    if let Some(index) = raw.abstract_inverted_index {
        paper.abstract_text = Some(reconstruct_abstract(&index));
    }

    paper.keywords = raw
        .concepts
        .into_iter()
        .filter_map(|c| c.display_name)
        .take(10)
        .collect();

    Some(paper)
}

#[async_trait]
impl SourceAdapter for OpenAlexAdapter {
    fn name(&self) -> &str {
        "OpenAlex"
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<Paper>> {
        if query.trim().is_empty() {
            return Err(Error::InvalidInput { field: "query".to_string(), reason: "must not be empty".to_string() });
        }
        let encoded = urlencoding::encode(query);
        let mail = self
            .email
            .as_deref()
            .map(|e| format!("&mailto={}", urlencoding::encode(e)))
            .unwrap_or_default();
        let url = format!("{BASE_URL}?search={encoded}&per_page={limit}{mail}");
        let response = self.client.get(&url).await?;
        let body: SearchResponse = crate::http_client::json(response, "openalex search").await?;
        Ok(body.results.into_iter().filter_map(to_paper).collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Paper>> {
        if id.trim().is_empty() {
            return Err(Error::InvalidInput { field: "id".to_string(), reason: "must not be empty".to_string() });
        }
        let trimmed = id.trim_start_matches("openalex_");
        let url = format!("{BASE_URL}/{trimmed}");
        let response = self.client.get(&url).await?;
        let raw: RawWork = crate::http_client::json(response, "openalex work").await?;
        Ok(to_paper(raw))
    }

    async fn get_citations(&self, paper: &Paper, limit: u32) -> Result<Vec<Paper>> {
        let trimmed = paper.id.trim_start_matches("openalex_");
        let url = format!("{BASE_URL}?filter=cites:{trimmed}&per_page={limit}");
        let response = self.client.get(&url).await?;
        let body: SearchResponse = crate::http_client::json(response, "openalex citations").await?;
        Ok(body.results.into_iter().filter_map(to_paper).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconstructs_abstract_from_inverted_index() {
        let mut index = HashMap::new();
        index.insert("Deep".to_string(), vec![0]);
        index.insert("learning".to_string(), vec![1]);
        index.insert("works".to_string(), vec![2]);
        assert_eq!(reconstruct_abstract(&index), "Deep learning works");
    }

    #[test]
    fn strips_known_url_prefixes() {
        assert_eq!(strip_prefix("https://orcid.org/0000-0001"), "0000-0001");
        assert_eq!(strip_prefix("https://doi.org/10.1/x"), "10.1/x");
    }

    #[test]
    fn maps_known_work_types() {
        assert_eq!(map_type(Some("preprint")), SourceType::Preprint);
        assert_eq!(map_type(Some("unknown-type")), SourceType::Unknown);
    }
}
