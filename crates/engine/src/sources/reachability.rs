use async_trait::async_trait;
use reqwest::StatusCode;
use scraper::Html;

use hallucheck_common::{HallucheckError, Result};

use super::{host_key, HttpContext, Reachability};

const SOURCE: &str = "web";

/// Most of a page body ever read. Relevance scoring only looks at the start
/// of the readable text, but markup ahead of it can be large.
const MAX_BODY_BYTES: usize = 512 * 1024;

/// Elements whose text never counts as page content.
const SKIPPED_ELEMENTS: [&str; 8] = [
    "script", "style", "nav", "footer", "header", "noscript", "svg", "template",
];

/// Checks cited URLs over plain HTTP, rate-limited per host.
pub struct HttpReachability {
    ctx: HttpContext,
}

impl HttpReachability {
    pub fn new(ctx: HttpContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Reachability for HttpReachability {
    async fn head_or_get(&self, url: &str) -> Result<u16> {
        let key = host_key(url);
        let response = self
            .ctx
            .send(&key, SOURCE, self.ctx.http.head(url), HallucheckError::Reachability)
            .await?;

        let status = response.status();
        if status != StatusCode::METHOD_NOT_ALLOWED && status != StatusCode::NOT_IMPLEMENTED {
            return Ok(status.as_u16());
        }

        tracing::debug!(url, status = status.as_u16(), "HEAD refused, retrying with GET");
        let response = self
            .ctx
            .send(&key, SOURCE, self.ctx.http.get(url), HallucheckError::Reachability)
            .await?;
        Ok(response.status().as_u16())
    }

    async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self
            .ctx
            .send(&host_key(url), SOURCE, self.ctx.http.get(url), HallucheckError::Reachability)
            .await?;

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("html"));

        let body = read_prefix(response, MAX_BODY_BYTES)
            .await
            .map_err(|e| HallucheckError::Reachability(format!("{}: {}", url, e)))?;
        let body = String::from_utf8_lossy(&body);

        Ok(if is_html {
            readable_text(&body)
        } else {
            body.into_owned()
        })
    }
}

/// At most `limit` bytes of the body; the rest is never downloaded.
async fn read_prefix(mut response: reqwest::Response, limit: usize) -> reqwest::Result<Vec<u8>> {
    let mut body = Vec::new();
    while body.len() < limit {
        let Some(chunk) = response.chunk().await? else {
            break;
        };
        let take = chunk.len().min(limit - body.len());
        body.extend_from_slice(&chunk[..take]);
    }
    Ok(body)
}

/// Visible text of an HTML document, whitespace-collapsed, without
/// scripts, styles or navigation chrome.
pub fn readable_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let visible = document.root_element().descendants().filter_map(|node| {
        let text = node.value().as_text()?;
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| SKIPPED_ELEMENTS.contains(&el.name()))
        });
        (!hidden).then_some(&**text)
    });

    visible
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text content of an HTML or XML fragment.
pub fn strip_markup(fragment: &str) -> String {
    let fragment = Html::parse_fragment(fragment);
    let text: String = fragment.root_element().text().collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
