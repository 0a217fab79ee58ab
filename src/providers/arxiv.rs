//! arXiv adapter: Atom XML over the legacy export API, grounded on
//! `original_source/backend/adapters/arxiv.py` and the Rust teacher's
//! `client/providers/arxiv.rs` for the roxmltree traversal idiom.

use async_trait::async_trait;
use roxmltree::Document;

use crate::error::{Error, Result};
use crate::http_client::HttpClient;
use crate::model::{AccessType, Author, Paper, SourceType};
use crate::providers::traits::{AdapterConfig, SourceAdapter};
use crate::text::extract_arxiv_id;

const BASE_URL: &str = "http://export.arxiv.org/api/query";

pub struct ArxivAdapter {
    client: HttpClient,
}

impl ArxivAdapter {
    pub fn new(_config: AdapterConfig) -> Result<Self> {
        let client = HttpClient::new("scholar-federation/0.1", 1.0)?;
        Ok(Self { client })
    }
}

fn parse_feed(xml: &str) -> Result<Vec<Paper>> {
    let doc = Document::parse(xml).map_err(|err| Error::Parse {
        context: "arxiv feed".to_string(),
        message: err.to_string(),
    })?;

    Ok(doc
        .descendants()
        .filter(|n| n.has_tag_name("entry"))
        .filter_map(parse_entry)
        .collect())
}

fn parse_entry(entry: roxmltree::Node) -> Option<Paper> {
    let id_text = entry
        .children()
        .find(|n| n.has_tag_name("id"))
        .and_then(|n| n.text())?;
    let arxiv_id = extract_arxiv_id(id_text)?;

    let title = entry
        .children()
        .find(|n| n.has_tag_name("title"))
        .and_then(|n| n.text())
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_else(|| "Unknown".to_string());

    let mut paper = Paper::new(format!("arxiv_{arxiv_id}"), title, "arXiv");
    paper.arxiv_id = Some(arxiv_id.clone());
    paper.source_type = SourceType::Preprint;
    paper.access_type = AccessType::Open;
    paper.pdf_url = Some(format!("https://arxiv.org/pdf/{arxiv_id}.pdf"));
    paper.html_url = Some(format!("https://arxiv.org/abs/{arxiv_id}"));

    paper.abstract_text = entry
        .children()
        .find(|n| n.has_tag_name("summary"))
        .and_then(|n| n.text())
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "));

    if let Some(published) = entry
        .children()
        .find(|n| n.has_tag_name("published"))
        .and_then(|n| n.text())
    {
        paper.year = published.split('-').next().and_then(|y| y.parse().ok());
    }

    paper.authors = entry
        .children()
        .filter(|n| n.has_tag_name("author"))
        .filter_map(|author| {
            author
                .children()
                .find(|n| n.has_tag_name("name"))
                .and_then(|n| n.text())
                .map(|name| Author::new(name.trim()))
        })
        .collect();

    let journal_ref = entry
        .children()
        .find(|n| n.tag_name().name() == "journal_ref")
        .and_then(|n| n.text())
        .map(str::to_string);
    let primary_category = entry
        .children()
        .find(|n| n.tag_name().name() == "primary_category")
        .and_then(|n| n.attribute("term"))
        .map(str::to_string);

    paper.journal = journal_ref.or_else(|| {
        primary_category
            .map(|cat| format!("arXiv:{cat}"))
            .or_else(|| Some("arXiv".to_string()))
    });

    Some(paper)
}

#[async_trait]
impl SourceAdapter for ArxivAdapter {
    fn name(&self) -> &str {
        "arXiv"
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<Paper>> {
        if query.trim().is_empty() {
            return Err(Error::InvalidInput { field: "query".to_string(), reason: "must not be empty".to_string() });
        }
        let encoded = urlencoding::encode(&format!("all:\"{query}\""));
        let url = format!(
            "{BASE_URL}?search_query={encoded}&start=0&max_results={limit}&sortBy=relevance&sortOrder=descending"
        );
        let response = self.client.get(&url).await?;
        let body = crate::http_client::text(response, "arxiv feed").await?;
        parse_feed(&body)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Paper>> {
        if id.trim().is_empty() {
            return Err(Error::InvalidInput { field: "id".to_string(), reason: "must not be empty".to_string() });
        }
        let trimmed = id.trim_start_matches("arxiv_");
        let url = format!("{BASE_URL}?id_list={trimmed}");
        let response = self.client.get(&url).await?;
        let body = crate::http_client::text(response, "arxiv feed").await?;
        Ok(parse_feed(&body)?.into_iter().next())
    }
}
