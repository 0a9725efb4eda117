use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use hallucheck_common::types::{BibRecord, Evidence};
use hallucheck_common::{HallucheckError, Result};

use super::{ensure_success, join_segment, read_json, Bibliography, EvidenceSource, HttpContext};

const SOURCE: &str = "semantic_scholar";
const PAPER_FIELDS: &str = "title,abstract,year,authors,url";
const BIBLIOGRAPHY_LIMIT: u32 = 5;
const EVIDENCE_LIMIT: u32 = 3;

/// Semantic Scholar graph API. Serves both as a bibliography and as a
/// scholarly evidence source.
pub struct SemanticScholarClient {
    ctx: HttpContext,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct Paper {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, rename = "abstract")]
    abstract_text: Option<String>,
    #[serde(default)]
    year: Option<i32>,
    #[serde(default)]
    authors: Vec<PaperAuthor>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Deserialize)]
struct PaperAuthor {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Paper>,
}

impl From<Paper> for BibRecord {
    fn from(paper: Paper) -> Self {
        BibRecord {
            source: SOURCE.into(),
            title: paper.title.unwrap_or_default(),
            abstract_text: paper.abstract_text.unwrap_or_default(),
            year: paper.year,
            authors: paper.authors.into_iter().filter_map(|a| a.name).collect(),
            url: paper.url,
        }
    }
}

impl SemanticScholarClient {
    /// Reads `SEMANTIC_SCHOLAR_API_KEY` when set; the public rate tier is
    /// used otherwise.
    pub fn new(ctx: HttpContext, base_url: impl Into<String>) -> Self {
        let api_key = std::env::var("SEMANTIC_SCHOLAR_API_KEY")
            .ok()
            .filter(|k| !k.is_empty());
        if api_key.is_none() {
            tracing::info!("SEMANTIC_SCHOLAR_API_KEY not set, using unauthenticated access");
        }
        Self {
            ctx,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorized(self.ctx.http.get(format!("{}{}", self.base_url, path)))
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("x-api-key", key),
            None => request,
        }
    }

    async fn search_papers(
        &self,
        query: &str,
        limit: u32,
        error: fn(String) -> HallucheckError,
    ) -> Result<Vec<Paper>> {
        let limit = limit.to_string();
        let request = self.get("/paper/search").query(&[
            ("query", query),
            ("limit", limit.as_str()),
            ("fields", PAPER_FIELDS),
        ]);
        let response = self.ctx.send(SOURCE, SOURCE, request, error).await?;
        let response = ensure_success(response, SOURCE, error).await?;
        let body: SearchResponse = read_json(response, SOURCE, error).await?;
        Ok(body.data)
    }
}

#[async_trait]
impl Bibliography for SemanticScholarClient {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn lookup_doi(&self, doi: &str) -> Result<Option<BibRecord>> {
        let url = join_segment(
            &format!("{}/paper/", self.base_url),
            &format!("DOI:{}", doi),
            SOURCE,
            HallucheckError::Bibliography,
        )?;
        let request = self
            .authorized(self.ctx.http.get(url))
            .query(&[("fields", PAPER_FIELDS)]);
        let response = self
            .ctx
            .send(SOURCE, SOURCE, request, HallucheckError::Bibliography)
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = ensure_success(response, SOURCE, HallucheckError::Bibliography).await?;
        let paper: Paper = read_json(response, SOURCE, HallucheckError::Bibliography).await?;
        Ok(Some(paper.into()))
    }

    async fn search_author_year(&self, surname: &str, year: &str) -> Result<Vec<BibRecord>> {
        let papers = self
            .search_papers(
                &format!("{} {}", surname, year),
                BIBLIOGRAPHY_LIMIT,
                HallucheckError::Bibliography,
            )
            .await?;
        Ok(papers.into_iter().map(BibRecord::from).collect())
    }
}

#[async_trait]
impl EvidenceSource for SemanticScholarClient {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn search(&self, query: &str) -> Result<Vec<Evidence>> {
        let papers = self
            .search_papers(query, EVIDENCE_LIMIT, HallucheckError::Evidence)
            .await?;

        Ok(papers
            .into_iter()
            .map(|paper| {
                let title = paper.title.unwrap_or_default();
                Evidence {
                    source: SOURCE.into(),
                    text: paper.abstract_text.unwrap_or_else(|| title.clone()),
                    title,
                    url: paper.url.unwrap_or_default(),
                }
            })
            .collect())
    }
}
