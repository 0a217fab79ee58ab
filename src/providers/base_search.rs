//! BASE (Bielefeld Academic Search Engine) adapter, grounded on
//! `original_source/backend/adapters/base_search.py`. BASE's Dublin Core
//! response shape lets fields be either a bare scalar or a list depending
//! on the record, and never supports direct lookup by id.

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::{self, Deserializer};

use crate::error::{Error, Result};
use crate::http_client::HttpClient;
use crate::model::{AccessType, Author, Paper, SourceType};
use crate::providers::traits::{AdapterConfig, SourceAdapter};
use crate::text::scavenge_doi;

const BASE_URL: &str = "https://api.base-search.net/cgi-bin/BaseHttpSearchInterface.fcgi";

pub struct BaseAdapter {
    client: HttpClient,
}

impl BaseAdapter {
    pub fn new(_config: AdapterConfig) -> Result<Self> {
        let client = HttpClient::new("scholar-federation/0.1", 1.0)?;
        Ok(Self { client })
    }
}

/// Deserializes either a single string or a list of strings into a `Vec`,
/// mirroring the reference implementation's `isinstance(x, list)` checks.
fn scalar_or_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Vec<String>;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error> {
            let mut out = Vec::new();
            while let Some(item) = seq.next_element::<String>()? {
                out.push(item);
            }
            Ok(out)
        }

        fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
            Ok(Vec::new())
        }
    }
    deserializer.deserialize_any(Visitor)
}

#[derive(Deserialize)]
struct SearchResponse {
    response: ResponseBody,
}

#[derive(Deserialize, Default)]
struct ResponseBody {
    #[serde(default, rename = "docs")]
    docs: Vec<RawDoc>,
}

#[derive(Deserialize, Default)]
struct RawDoc {
    #[serde(default, rename = "dctitle", deserialize_with = "scalar_or_list")]
    title: Vec<String>,
    #[serde(default, rename = "dcauthor", deserialize_with = "scalar_or_list")]
    creator: Vec<String>,
    #[serde(default, rename = "dcdescription", deserialize_with = "scalar_or_list")]
    description: Vec<String>,
    #[serde(default, rename = "dcidentifier", deserialize_with = "scalar_or_list")]
    identifier: Vec<String>,
    #[serde(rename = "dcyear")]
    year: Option<String>,
    #[serde(rename = "dcoa")]
    open_access: Option<String>,
    #[serde(rename = "dcdocid")]
    id: Option<serde_json::Value>,
}

fn to_paper(raw: RawDoc) -> Option<Paper> {
    let id = raw.id.map(|v| v.to_string().trim_matches('"').to_string())?;
    let title = raw.title.into_iter().next().unwrap_or_else(|| "Unknown".to_string());
    let mut paper = Paper::new(format!("base_{id}"), title, "BASE");

    paper.authors = raw.creator.into_iter().map(Author::new).collect();
    paper.abstract_text = raw.description.into_iter().next();
    paper.year = raw.year.and_then(|y| y.parse().ok());
    paper.source_type = SourceType::Unknown;

    paper.doi = raw
        .identifier
        .iter()
        .find(|id| id.contains("10."))
        .and_then(|id| scavenge_doi(id));

    paper.access_type = match raw.open_access.as_deref() {
        Some("1") => AccessType::Open,
        _ => AccessType::Unknown,
    };

    Some(paper)
}

#[async_trait]
impl SourceAdapter for BaseAdapter {
    fn name(&self) -> &str {
        "BASE"
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<Paper>> {
        if query.trim().is_empty() {
            return Err(Error::InvalidInput { field: "query".to_string(), reason: "must not be empty".to_string() });
        }
        let encoded = urlencoding::encode(query);
        let hits = limit.min(125);
        let url = format!("{BASE_URL}?func=PerformSearch&query={encoded}&hits={hits}&format=json");
        let response = self.client.get(&url).await?;
        let body: SearchResponse = crate::http_client::json(response, "base search").await?;
        Ok(body.response.docs.into_iter().filter_map(to_paper).collect())
    }

    /// BASE does not support direct lookup by id.
    async fn get_by_id(&self, _id: &str) -> Result<Option<Paper>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scavenges_doi_from_identifier_list() {
        let raw = RawDoc {
            title: vec!["T".to_string()],
            identifier: vec![
                "urn:nbn:1234".to_string(),
                "https://doi.org/10.1234/abc".to_string(),
            ],
            id: Some(serde_json::json!(1)),
            ..Default::default()
        };
        let paper = to_paper(raw).expect("paper");
        assert_eq!(paper.doi.as_deref(), Some("10.1234/abc"));
    }

    #[test]
    fn open_access_flag_maps_to_open_else_unknown_never_paywalled() {
        let mut raw = RawDoc {
            title: vec!["T".to_string()],
            id: Some(serde_json::json!(1)),
            open_access: Some("1".to_string()),
            ..Default::default()
        };
        assert_eq!(to_paper_access(&raw), AccessType::Open);
        raw.open_access = Some("0".to_string());
        assert_eq!(to_paper_access(&raw), AccessType::Unknown);
        raw.open_access = None;
        assert_eq!(to_paper_access(&raw), AccessType::Unknown);
    }

    fn to_paper_access(raw: &RawDoc) -> AccessType {
        match raw.open_access.as_deref() {
            Some("1") => AccessType::Open,
            _ => AccessType::Unknown,
        }
    }
}
