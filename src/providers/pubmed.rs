//! PubMed adapter: a two-phase `esearch`/`efetch` call against NCBI
//! E-utilities, grounded on `original_source/backend/adapters/pubmed.py`.

use async_trait::async_trait;
use roxmltree::Document;

use crate::error::{Error, Result};
use crate::http_client::HttpClient;
use crate::model::{Author, Paper, SourceType};
use crate::providers::traits::{AdapterConfig, SourceAdapter};

const BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

pub struct PubMedAdapter {
    client: HttpClient,
    config: AdapterConfig,
}

impl PubMedAdapter {
    pub fn new(config: AdapterConfig) -> Result<Self> {
        let rate = if config.api_key.is_some() { 10.0 } else { 3.0 };
        let client = HttpClient::new("scholar-federation/0.1", rate)?;
        Ok(Self { client, config })
    }

    async fn esearch(&self, query: &str, limit: u32) -> Result<Vec<String>> {
        let url = format!("{BASE_URL}/esearch.fcgi");
        let mut params = vec![
            ("db".to_string(), "pubmed".to_string()),
            ("term".to_string(), query.to_string()),
            ("retmax".to_string(), limit.to_string()),
            ("retmode".to_string(), "json".to_string()),
        ];
        if let Some(key) = &self.config.api_key {
            params.push(("api_key".to_string(), key.clone()));
        }
        let response = self.client.get_with_query(&url, &params).await?;
        let body: serde_json::Value = crate::http_client::json(response, "pubmed esearch").await?;
        let ids = body["esearchresult"]["idlist"]
            .as_array()
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();
        Ok(ids)
    }

    async fn efetch(&self, pmids: &[String]) -> Result<Vec<Paper>> {
        if pmids.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{BASE_URL}/efetch.fcgi");
        let mut params = vec![
            ("db".to_string(), "pubmed".to_string()),
            ("id".to_string(), pmids.join(",")),
            ("retmode".to_string(), "xml".to_string()),
        ];
        if let Some(key) = &self.config.api_key {
            params.push(("api_key".to_string(), key.clone()));
        }
        let response = self.client.get_with_query(&url, &params).await?;
        let body = crate::http_client::text(response, "pubmed efetch").await?;
        parse_efetch(&body)
    }
}

fn parse_efetch(xml: &str) -> Result<Vec<Paper>> {
    let doc = Document::parse(xml).map_err(|err| Error::Parse {
        context: "pubmed efetch".to_string(),
        message: err.to_string(),
    })?;

    let mut papers = Vec::new();
    for article in doc.descendants().filter(|n| n.has_tag_name("PubmedArticle")) {
        if let Some(paper) = parse_article(article) {
            papers.push(paper);
        }
    }
    Ok(papers)
}

fn parse_article(article: roxmltree::Node) -> Option<Paper> {
    let pmid = article
        .descendants()
        .find(|n| n.has_tag_name("PMID"))
        .and_then(|n| n.text())?
        .to_string();

    let title = article
        .descendants()
        .find(|n| n.has_tag_name("ArticleTitle"))
        .and_then(|n| n.text())
        .unwrap_or("Unknown")
        .to_string();

    let mut paper = Paper::new(format!("pubmed_{pmid}"), title, "PubMed");
    paper.pmid = Some(pmid);
    paper.source_type = SourceType::PeerReviewed;

    paper.journal = article
        .descendants()
        .find(|n| n.has_tag_name("Title"))
        .and_then(|n| n.text())
        .map(str::to_string);

    if let Some(year_node) = article
        .descendants()
        .find(|n| n.has_tag_name("PubDate"))
        .and_then(|pub_date| pub_date.children().find(|n| n.has_tag_name("Year")))
    {
        paper.year = year_node.text().and_then(|t| t.parse().ok());
    }

    paper.abstract_text = article
        .descendants()
        .filter(|n| n.has_tag_name("AbstractText"))
        .filter_map(|n| n.text())
        .collect::<Vec<_>>()
        .join(" ")
        .into();
    if paper.abstract_text.as_deref() == Some("") {
        paper.abstract_text = None;
    }

    paper.authors = article
        .descendants()
        .filter(|n| n.has_tag_name("Author"))
        .filter_map(|author| {
            let last = author
                .children()
                .find(|n| n.has_tag_name("LastName"))
                .and_then(|n| n.text())?;
            let fore = author
                .children()
                .find(|n| n.has_tag_name("ForeName"))
                .and_then(|n| n.text());
            Some(Author::new(match fore {
                Some(fore) => format!("{fore} {last}"),
                None => last.to_string(),
            }))
        })
        .collect();

    for article_id in article.descendants().filter(|n| n.has_tag_name("ArticleId")) {
        let id_type = article_id.attribute("IdType").unwrap_or_default();
        if let Some(value) = article_id.text() {
            match id_type {
                "doi" => paper.doi = Some(value.to_string()),
                "pmc" => paper.pmcid = Some(value.to_string()),
                _ => {}
            }
        }
    }
    paper.access_type = if paper.pmcid.is_some() {
        crate::model::AccessType::Open
    } else {
        crate::model::AccessType::Unknown
    };

    paper.keywords = article
        .descendants()
        .filter(|n| n.has_tag_name("DescriptorName"))
        .filter_map(|n| n.text())
        .take(10)
        .map(str::to_string)
        .collect();

    Some(paper)
}

#[async_trait]
impl SourceAdapter for PubMedAdapter {
    fn name(&self) -> &str {
        "PubMed"
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<Paper>> {
        if query.trim().is_empty() {
            return Err(Error::InvalidInput { field: "query".to_string(), reason: "must not be empty".to_string() });
        }
        let pmids = self.esearch(query, limit).await?;
        self.efetch(&pmids).await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Paper>> {
        if id.trim().is_empty() {
            return Err(Error::InvalidInput { field: "id".to_string(), reason: "must not be empty".to_string() });
        }
        let pmids = vec![id.trim_start_matches("pubmed_").to_string()];
        Ok(self.efetch(&pmids).await?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    <PubmedArticleSet>
      <PubmedArticle>
        <MedlineCitation>
          <PMID>12345678</PMID>
          <Article>
            <Journal>
              <Title>Nature</Title>
              <JournalIssue>
                <PubDate><Year>2022</Year></PubDate>
              </JournalIssue>
            </Journal>
            <ArticleTitle>CRISPR in modern genomics</ArticleTitle>
            <Abstract>
              <AbstractText>Background text.</AbstractText>
            </Abstract>
            <AuthorList>
              <Author><LastName>Doe</LastName><ForeName>Jane</ForeName></Author>
            </AuthorList>
          </Article>
          <MeshHeadingList>
            <MeshHeading><DescriptorName>Genomics</DescriptorName></MeshHeading>
          </MeshHeadingList>
        </MedlineCitation>
        <PubmedData>
          <ArticleIdList>
            <ArticleId IdType="doi">10.1038/abcd</ArticleId>
            <ArticleId IdType="pmc">PMC123456</ArticleId>
          </ArticleIdList>
        </PubmedData>
      </PubmedArticle>
    </PubmedArticleSet>
    "#;

    #[test]
    fn parses_full_article() {
        let papers = parse_efetch(SAMPLE).expect("parses");
        assert_eq!(papers.len(), 1);
        let paper = &papers[0];
        assert_eq!(paper.id, "pubmed_12345678");
        assert_eq!(paper.title, "CRISPR in modern genomics");
        assert_eq!(paper.year, Some(2022));
        assert_eq!(paper.doi.as_deref(), Some("10.1038/abcd"));
        assert_eq!(paper.pmcid.as_deref(), Some("PMC123456"));
        assert_eq!(paper.access_type, crate::model::AccessType::Open);
        assert_eq!(paper.authors[0].name, "Jane Doe");
        assert_eq!(paper.keywords, vec!["Genomics".to_string()]);
    }

    #[test]
    fn missing_pmcid_leaves_access_unknown() {
        let xml = SAMPLE.replace(r#"<ArticleId IdType="pmc">PMC123456</ArticleId>"#, "");
        let papers = parse_efetch(&xml).expect("parses");
        assert_eq!(papers[0].access_type, crate::model::AccessType::Unknown);
    }
}
