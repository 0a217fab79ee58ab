//! CrossRef adapter, grounded on
//! `original_source/backend/adapters/crossref.py`. Uses the "polite pool"
//! rate tier and a `mailto:` user agent when an email is configured.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::http_client::HttpClient;
use crate::model::{Author, Paper, SourceType};
use crate::providers::traits::{AdapterConfig, SourceAdapter};
use crate::text::strip_tags;

const BASE_URL: &str = "https://api.crossref.org/works";

pub struct CrossRefAdapter {
    client: HttpClient,
    email: Option<String>,
}

impl CrossRefAdapter {
    pub fn new(config: AdapterConfig) -> Result<Self> {
        let user_agent = match &config.email {
            Some(email) => format!("scholar-federation/0.1 (mailto:{email})"),
            None => "scholar-federation/0.1".to_string(),
        };
        let client = HttpClient::new(&user_agent, 50.0)?;
        Ok(Self {
            client,
            email: config.email,
        })
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    message: MessageList,
}

#[derive(Deserialize)]
struct MessageList {
    #[serde(default)]
    items: Vec<RawWork>,
}

#[derive(Deserialize)]
struct SingleResponse {
    message: RawWork,
}

#[derive(Deserialize, Default)]
struct RawWork {
    #[serde(rename = "DOI")]
    doi: Option<String>,
    #[serde(default)]
    title: Vec<String>,
    #[serde(rename = "container-title", default)]
    container_title: Vec<String>,
    #[serde(default)]
    author: Vec<RawAuthor>,
    published: Option<PublishedDate>,
    #[serde(rename = "type")]
    work_type: Option<String>,
    #[serde(rename = "is-referenced-by-count")]
    citation_count: Option<u64>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    #[serde(default)]
    link: Vec<Link>,
}

#[derive(Deserialize)]
struct RawAuthor {
    given: Option<String>,
    family: Option<String>,
    #[serde(rename = "ORCID")]
    orcid: Option<String>,
}

#[derive(Deserialize)]
struct PublishedDate {
    #[serde(rename = "date-parts")]
    date_parts: Vec<Vec<i64>>,
}

#[derive(Deserialize)]
struct Link {
    #[serde(rename = "URL")]
    url: Option<String>,
    #[serde(rename = "content-type")]
    content_type: Option<String>,
}

fn map_type(work_type: Option<&str>) -> SourceType {
    match work_type {
        Some("journal-article") => SourceType::PeerReviewed,
        Some("proceedings-article") => SourceType::Conference,
        Some("book-chapter") => SourceType::BookChapter,
        Some("dissertation") => SourceType::Thesis,
        Some("posted-content") => SourceType::Preprint,
        _ => SourceType::Unknown,
    }
}

fn to_paper(mut raw: RawWork) -> Option<Paper> {
    let doi = raw.doi.take()?;
    let title = raw.title.first().cloned().unwrap_or_else(|| "Unknown".to_string());
    let mut paper = Paper::new(format!("crossref_{doi}"), title, "CrossRef");

    paper.doi = Some(doi);
    paper.journal = raw.container_title.first().cloned();
    paper.citation_count = raw.citation_count.unwrap_or(0);
    paper.source_type = map_type(raw.work_type.as_deref());

    paper.authors = raw
        .author
        .into_iter()
        .filter_map(|a| {
            let name = match (a.given, a.family) {
                (Some(given), Some(family)) => format!("{given} {family}"),
                (None, Some(family)) => family,
                (Some(given), None) => given,
                (None, None) => return None,
            };
            let mut built = Author::new(name);
            if let Some(orcid) = a.orcid {
                built = built.with_orcid(
                    orcid
                        .trim_start_matches("https://orcid.org/")
                        .trim_start_matches("http://orcid.org/")
                        .to_string(),
                );
            }
            Some(built)
        })
        .collect();

    paper.year = raw
        .published
        .and_then(|p| p.date_parts.first().cloned())
        .and_then(|parts| parts.first().copied())
        .map(|y| y as u32);

    paper.abstract_text = raw.abstract_text.map(|t| strip_tags(&t));

    paper.pdf_url = raw
        .link
        .into_iter()
        .find(|link| link.content_type.as_deref() == Some("application/pdf"))
        .and_then(|link| link.url);

    Some(paper)
}

#[async_trait]
impl SourceAdapter for CrossRefAdapter {
    fn name(&self) -> &str {
        "CrossRef"
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
        let url = format!("{BASE_URL}?query={encoded}&rows={limit}{mail}");
        let response = self.client.get(&url).await?;
        let body: SearchResponse = crate::http_client::json(response, "crossref search").await?;
        Ok(body.message.items.into_iter().filter_map(to_paper).collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Paper>> {
        if id.trim().is_empty() {
            return Err(Error::InvalidInput { field: "id".to_string(), reason: "must not be empty".to_string() });
        }
        let trimmed = id.trim_start_matches("crossref_");
        let url = format!("{BASE_URL}/{trimmed}");
        let response = self.client.get(&url).await?;
        let body: SingleResponse = crate::http_client::json(response, "crossref work").await?;
        Ok(to_paper(body.message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_posted_content_to_preprint() {
        assert_eq!(map_type(Some("posted-content")), SourceType::Preprint);
    }

    #[test]
    fn joins_given_and_family_name() {
        let raw = RawWork {
            doi: Some("10.1/x".to_string()),
            title: vec!["Title".to_string()],
            author: vec![RawAuthor {
                given: Some("Jane".to_string()),
                family: Some("Doe".to_string()),
                orcid: Some("https://orcid.org/0000-0001".to_string()),
            }],
            ..Default::default()
        };
        let paper = to_paper(raw).expect("paper");
        assert_eq!(paper.authors[0].name, "Jane Doe");
        assert_eq!(paper.authors[0].orcid.as_deref(), Some("0000-0001"));
    }

    #[test]
    fn strips_jats_tags_from_abstract() {
        let raw = RawWork {
            doi: Some("10.1/x".to_string()),
            title: vec!["Title".to_string()],
            abstract_text: Some("<jats:p>Body</jats:p>".to_string()),
            ..Default::default()
        };
        let paper = to_paper(raw).expect("paper");
        assert_eq!(paper.abstract_text.as_deref(), Some("Body"));
    }

    #[test]
    fn missing_doi_is_skipped() {
        let raw = RawWork {
            title: vec!["Title".to_string()],
            ..Default::default()
        };
        assert!(to_paper(raw).is_none());
    }
}
