use async_trait::async_trait;
use serde::Deserialize;

use hallucheck_common::types::Evidence;
use hallucheck_common::{HallucheckError, Result};

use super::{ensure_success, join_segment, read_json, strip_markup, EvidenceSource, HttpContext};

const SOURCE: &str = "wikipedia";
const SEARCH_LIMIT: &str = "3";

/// Wikipedia evidence: the page summary for the query as a title, falling
/// back to full-text search when no such page exists.
pub struct WikipediaClient {
    ctx: HttpContext,
    base_url: String,
}

#[derive(Deserialize)]
struct Summary {
    #[serde(default)]
    title: String,
    #[serde(default)]
    extract: String,
    #[serde(default)]
    content_urls: Option<ContentUrls>,
}

#[derive(Deserialize)]
struct ContentUrls {
    desktop: PageUrl,
}

#[derive(Deserialize)]
struct PageUrl {
    page: String,
}

#[derive(Deserialize)]
struct SearchResults {
    #[serde(default)]
    pages: Vec<SearchPage>,
}

#[derive(Deserialize)]
struct SearchPage {
    key: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    excerpt: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl WikipediaClient {
    pub fn new(ctx: HttpContext, base_url: impl Into<String>) -> Self {
        Self {
            ctx,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// `Ok(None)` when the query does not name an article.
    async fn summary(&self, query: &str) -> Result<Option<Evidence>> {
        let url = join_segment(
            &format!("{}/api/rest_v1/page/summary/", self.base_url),
            &query.replace(' ', "_"),
            SOURCE,
            HallucheckError::Evidence,
        )?;

        let response = self
            .ctx
            .send(SOURCE, SOURCE, self.ctx.http.get(url), HallucheckError::Evidence)
            .await?;
        if !response.status().is_success() {
            return Ok(None);
        }

        let summary: Summary = read_json(response, SOURCE, HallucheckError::Evidence).await?;
        if summary.extract.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(Evidence {
            source: SOURCE.into(),
            title: summary.title,
            text: summary.extract,
            url: summary
                .content_urls
                .map(|urls| urls.desktop.page)
                .unwrap_or_default(),
        }))
    }

    async fn full_text_search(&self, query: &str) -> Result<Vec<Evidence>> {
        let request = self
            .ctx
            .http
            .get(format!("{}/w/rest.php/v1/search/page", self.base_url))
            .query(&[("q", query), ("limit", SEARCH_LIMIT)]);
        let response = self
            .ctx
            .send(SOURCE, SOURCE, request, HallucheckError::Evidence)
            .await?;
        let response = ensure_success(response, SOURCE, HallucheckError::Evidence).await?;
        let results: SearchResults = read_json(response, SOURCE, HallucheckError::Evidence).await?;

        Ok(results
            .pages
            .into_iter()
            .map(|page| {
                // Excerpts carry <span class="searchmatch"> highlighting.
                let parts: Vec<String> = [page.description, page.excerpt.map(|e| strip_markup(&e))]
                    .into_iter()
                    .flatten()
                    .filter(|p| !p.trim().is_empty())
                    .collect();
                Evidence {
                    source: SOURCE.into(),
                    title: page.title,
                    text: parts.join(". "),
                    url: format!("{}/wiki/{}", self.base_url, page.key),
                }
            })
            .collect())
    }
}

#[async_trait]
impl EvidenceSource for WikipediaClient {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn search(&self, query: &str) -> Result<Vec<Evidence>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        match self.summary(query).await {
            Ok(Some(evidence)) => return Ok(vec![evidence]),
            Ok(None) => {}
            Err(e) => tracing::debug!(error = %e, "Wikipedia summary failed, trying search"),
        }

        self.full_text_search(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::testing;
    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    async fn server() -> String {
        let router = Router::new()
            .route(
                "/api/rest_v1/page/summary/{title}",
                get(|Path(title): Path<String>| async move {
                    if title == "Eiffel_Tower" {
                        Ok(Json(json!({
                            "title": "Eiffel Tower",
                            "extract": "The Eiffel Tower is a wrought-iron lattice tower in Paris.",
                            "content_urls": {"desktop": {"page": "https://en.wikipedia.org/wiki/Eiffel_Tower"}}
                        })))
                    } else {
                        Err(StatusCode::NOT_FOUND)
                    }
                }),
            )
            .route(
                "/w/rest.php/v1/search/page",
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    assert_eq!(params["limit"], "3");
                    Json(json!({"pages": [{
                        "key": "Water",
                        "title": "Water",
                        "excerpt": "<span class=\"searchmatch\">Water</span> boils at 100 degrees",
                        "description": "Chemical compound"
                    }]}))
                }),
            );
        testing::serve(router).await
    }

    #[tokio::test]
    async fn test_summary_hit() {
        let base = server().await;
        let client = WikipediaClient::new(testing::context(), base);

        let evidence = client.search("Eiffel Tower").await.unwrap();
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].title, "Eiffel Tower");
        assert!(evidence[0].text.contains("lattice tower"));
        assert_eq!(evidence[0].url, "https://en.wikipedia.org/wiki/Eiffel_Tower");
    }

    #[tokio::test]
    async fn test_falls_back_to_search() {
        let base = server().await;
        let client = WikipediaClient::new(testing::context(), base.clone());

        let evidence = client.search("Water boils 1000").await.unwrap();
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].text, "Chemical compound. Water boils at 100 degrees");
        assert_eq!(evidence[0].url, format!("{}/wiki/Water", base));
    }

    #[tokio::test]
    async fn test_empty_query_makes_no_calls() {
        let client = WikipediaClient::new(testing::context(), "http://127.0.0.1:1");
        assert!(client.search("  ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_evidence_error() {
        let client = WikipediaClient::new(testing::context(), "http://127.0.0.1:1");
        let err = client.search("anything").await.unwrap_err();
    }
}
