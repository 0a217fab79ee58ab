//! Unpaywall adapter, grounded on
//! `original_source/backend/adapters/unpaywall.py`. Unlike every other
//! source, Unpaywall never contributes new papers: `search`/`get_by_id`
//! are no-ops (it implements [`SourceAdapter`] only so the orchestrator can
//! hold it alongside the others), and its real work happens through
//! [`UnpaywallAdapter::enrich`], called once per merged paper that carries
//! a DOI (§4.3, §4.4 phase 4.5).

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;
use crate::http_client::HttpClient;
use crate::model::{AccessType, Paper};
use crate::providers::traits::{AdapterConfig, SourceAdapter};

const BASE_URL: &str = "https://api.unpaywall.org/v2";

pub struct UnpaywallAdapter {
    client: HttpClient,
    email: String,
}

impl UnpaywallAdapter {
    pub fn new(config: AdapterConfig) -> Result<Self> {
        let client = HttpClient::new("scholar-federation/0.1", 10.0)?;
        Ok(Self {
            client,
            email: config.email.unwrap_or_else(|| "user@example.com".to_string()),
        })
    }

    async fn find_open_access(&self, doi: &str) -> Result<Option<OpenAccessInfo>> {
        let url = format!("{BASE_URL}/{doi}?email={}", urlencoding::encode(&self.email));
        let response = match self.client.get(&url).await {
            Ok(response) => response,
            Err(_) => return Ok(None),
        };
        let record: UnpaywallRecord = match crate::http_client::json(response, "unpaywall").await {
            Ok(record) => record,
            Err(_) => return Ok(None),
        };

        if !record.is_oa {
            return Ok(None);
        }
        Ok(Some(OpenAccessInfo {
            pdf_url: record.best_oa_location.as_ref().and_then(|l| l.url_for_pdf.clone()),
            html_url: record.best_oa_location.and_then(|l| l.url),
        }))
    }

    /// Monotone-upgrade-only enrichment: only fills in fields the paper
    /// doesn't already have, and only ever raises access toward `Open`.
    /// Any failure leaves `paper` unchanged (best-effort enrichment, never
    /// a hard dependency for the pipeline).
    pub async fn enrich(&self, paper: &mut Paper) {
        let Some(doi) = paper.doi.clone() else { return };
        let Ok(Some(info)) = self.find_open_access(&doi).await else {
            return;
        };

        paper.access_type = AccessType::Open;
        if paper.pdf_url.is_none() {
            paper.pdf_url = info.pdf_url;
        }
        if paper.html_url.is_none() {
            if let Some(html_url) = info.html_url {
                paper.urls.entry("oaHtml".to_string()).or_insert(html_url.clone());
                paper.html_url = Some(html_url);
            }
        }
    }
}

struct OpenAccessInfo {
    pdf_url: Option<String>,
    html_url: Option<String>,
}

#[derive(Deserialize)]
struct UnpaywallRecord {
    #[serde(default)]
    is_oa: bool,
    best_oa_location: Option<OaLocation>,
}

#[derive(Deserialize, Clone)]
struct OaLocation {
    url: Option<String>,
    url_for_pdf: Option<String>,
}

#[async_trait]
impl SourceAdapter for UnpaywallAdapter {
    fn name(&self) -> &str {
        "Unpaywall"
    }

    async fn search(&self, _query: &str, _limit: u32) -> Result<Vec<Paper>> {
        Ok(Vec::new())
    }

    async fn get_by_id(&self, _id: &str) -> Result<Option<Paper>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_open_access_yields_no_enrichment() {
        let record = UnpaywallRecord {
            is_oa: false,
            best_oa_location: None,
        };
        assert!(!record.is_oa);
    }

    #[tokio::test]
    async fn enrich_is_noop_without_doi() {
        let adapter = UnpaywallAdapter::new(AdapterConfig::new("Unpaywall", 10.0)).expect("adapter");
        let mut paper = Paper::new("x_1", "Title", "X");
        adapter.enrich(&mut paper).await;
        assert_eq!(paper.access_type, AccessType::Unknown);
    }
}
