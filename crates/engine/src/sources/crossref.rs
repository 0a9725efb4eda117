use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use hallucheck_common::types::BibRecord;
use hallucheck_common::{HallucheckError, Result};

use super::{ensure_success, join_segment, read_json, strip_markup, Bibliography, HttpContext};

const SOURCE: &str = "crossref";
const SEARCH_ROWS: u32 = 5;

/// CrossRef works API.
pub struct CrossrefClient {
    ctx: HttpContext,
    base_url: String,
    /// Contact address for CrossRef's polite pool.
    mailto: Option<String>,
}

#[derive(Deserialize)]
struct WorkEnvelope {
    message: Work,
}

#[derive(Deserialize)]
struct SearchEnvelope {
    message: SearchMessage,
}

#[derive(Deserialize)]
struct SearchMessage {
    #[serde(default)]
    items: Vec<Work>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct Work {
    title: Vec<String>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    author: Vec<WorkAuthor>,
    #[serde(rename = "published-print")]
    published_print: Option<DateParts>,
    #[serde(rename = "published-online")]
    published_online: Option<DateParts>,
    issued: Option<DateParts>,
    #[serde(rename = "URL")]
    url: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct WorkAuthor {
    given: Option<String>,
    family: Option<String>,
    name: Option<String>,
}

#[derive(Deserialize)]
struct DateParts {
    #[serde(rename = "date-parts", default)]
    date_parts: Vec<Vec<Option<i32>>>,
}

impl DateParts {
    fn year(&self) -> Option<i32> {
        self.date_parts.first()?.first().copied().flatten()
    }
}

impl From<Work> for BibRecord {
    fn from(work: Work) -> Self {
        let year = [&work.published_print, &work.published_online, &work.issued]
            .into_iter()
            .flatten()
            .find_map(DateParts::year);

        let authors = work
            .author
            .into_iter()
            .filter_map(|a| match (a.given, a.family, a.name) {
                (Some(given), Some(family), _) => Some(format!("{} {}", given, family)),
                (None, Some(family), _) => Some(family),
                (_, None, name) => name,
            })
            .collect();

        BibRecord {
            source: SOURCE.into(),
            title: work.title.into_iter().next().unwrap_or_default(),
            // CrossRef abstracts are JATS XML.
            abstract_text: work
                .abstract_text
                .map(|a| strip_markup(&a))
                .unwrap_or_default(),
            year,
            authors,
            url: work.url,
        }
    }
}

impl CrossrefClient {
    /// Reads `CROSSREF_MAILTO` for the polite pool when set.
    pub fn new(ctx: HttpContext, base_url: impl Into<String>) -> Self {
        let mailto = std::env::var("CROSSREF_MAILTO")
            .ok()
            .filter(|m| !m.is_empty());
        Self {
            ctx,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            mailto,
        }
    }

    fn with_mailto(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.mailto {
            Some(mailto) => request.query(&[("mailto", mailto)]),
            None => request,
        }
    }
}

#[async_trait]
impl Bibliography for CrossrefClient {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn lookup_doi(&self, doi: &str) -> Result<Option<BibRecord>> {
        let url = join_segment(&self.base_url, doi, SOURCE, HallucheckError::Bibliography)?;
        let request = self.with_mailto(self.ctx.http.get(url));
        let response = self
            .ctx
            .send(SOURCE, SOURCE, request, HallucheckError::Bibliography)
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(doi, "DOI not registered with CrossRef");
            return Ok(None);
        }

        let response = ensure_success(response, SOURCE, HallucheckError::Bibliography).await?;
        let envelope: WorkEnvelope =
            read_json(response, SOURCE, HallucheckError::Bibliography).await?;
        Ok(Some(envelope.message.into()))
    }

    async fn search_author_year(&self, surname: &str, year: &str) -> Result<Vec<BibRecord>> {
        let query = format!("{} {}", surname, year);
        let rows = SEARCH_ROWS.to_string();
        let request = self.with_mailto(
            self.ctx
                .http
                .get(&self.base_url)
                .query(&[("query", query.as_str()), ("rows", rows.as_str())]),
        );
        let response = self
            .ctx
            .send(SOURCE, SOURCE, request, HallucheckError::Bibliography)
            .await?;
        let response = ensure_success(response, SOURCE, HallucheckError::Bibliography).await?;
        let envelope: SearchEnvelope =
            read_json(response, SOURCE, HallucheckError::Bibliography).await?;

        Ok(envelope
            .message
            .items
            .into_iter()
            .map(BibRecord::from)
            .collect())
    }
}
