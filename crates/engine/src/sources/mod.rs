//! External collaborators: bibliographic databases, web reachability,
//! evidence search, similarity and entailment models.
//!
//! Each concern sits behind a trait so verification can run against
//! in-memory fakes in tests.

mod crossref;
mod embeddings;
mod entailment;
mod lexical;
mod rate_limit;
mod reachability;
mod semantic_scholar;
mod wikipedia;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use hallucheck_common::types::{BibRecord, Evidence};
use hallucheck_common::{HallucheckError, Result};

pub use crossref::CrossrefClient;
pub use embeddings::{cosine_similarity, EmbeddingSimilarity};
pub use entailment::{HttpEntailment, NeutralEntailment};
pub use lexical::LexicalSimilarity;
pub use rate_limit::{host_key, DomainRateLimiter};
pub use reachability::{readable_text, strip_markup, HttpReachability};
pub use semantic_scholar::SemanticScholarClient;
pub use wikipedia::WikipediaClient;

/// A bibliographic database that can resolve DOIs and author-year queries.
#[async_trait]
pub trait Bibliography: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` when the DOI is unknown to this source.
    async fn lookup_doi(&self, doi: &str) -> Result<Option<BibRecord>>;

    /// Candidate records for a surname and year. Callers do their own
    /// matching; sources return whatever their search ranks highest.
    async fn search_author_year(&self, surname: &str, year: &str) -> Result<Vec<BibRecord>>;
}

/// Liveness and content checks for cited URLs.
#[async_trait]
pub trait Reachability: Send + Sync {
    /// Final HTTP status after redirects. HEAD first, GET when the server
    /// refuses HEAD.
    async fn head_or_get(&self, url: &str) -> Result<u16>;

    /// Readable text of the page.
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

/// A searchable corpus of evidence passages.
#[async_trait]
pub trait EvidenceSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn search(&self, query: &str) -> Result<Vec<Evidence>>;
}

/// Semantic similarity between a claim and evidence, in `[0, 1]`.
#[async_trait]
pub trait Similarity: Send + Sync {
    async fn similarity(&self, claim: &str, evidence: &str) -> Result<f64>;

    /// Similarity of `claim` against each text, in order.
    async fn similarities(&self, claim: &str, texts: &[&str]) -> Result<Vec<f64>> {
        let mut scores = Vec::with_capacity(texts.len());
        for text in texts {
            scores.push(self.similarity(claim, text).await?);
        }
        Ok(scores)
    }
}

/// Probabilities from an entailment classifier. Sum to 1.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntailmentScores {
    pub entailment: f64,
    pub neutral: f64,
    pub contradiction: f64,
}

/// Three-way entailment classification of a claim against evidence.
#[async_trait]
pub trait Entailment: Send + Sync {
    async fn classify(&self, claim: &str, evidence: &str) -> Result<EntailmentScores>;
}

/// Shared HTTP plumbing for the outbound clients.
#[derive(Clone)]
pub struct HttpContext {
    pub http: reqwest::Client,
    pub limiter: Arc<DomainRateLimiter>,
    pub timeout: Duration,
}

impl HttpContext {
    pub fn new(http: reqwest::Client, limiter: Arc<DomainRateLimiter>, timeout: Duration) -> Self {
        Self {
            http,
            limiter,
            timeout,
        }
    }

    /// Send `request` once a permit for `key` is available. The timeout
    /// starts when the permit is granted.
    ///
    /// Transport failures map through `error` except timeouts, which become
    /// [`HallucheckError::Timeout`].
    pub(crate) async fn send(
        &self,
        key: &str,
        source: &'static str,
        request: reqwest::RequestBuilder,
        error: fn(String) -> HallucheckError,
    ) -> Result<reqwest::Response> {
        self.limiter.acquire(key).await;

        let start = Instant::now();
        let result = request.timeout(self.timeout).send().await;
        metrics::histogram!("sources.latency", "source" => source)
            .record(start.elapsed().as_secs_f64());

        result.map_err(|e| {
            metrics::counter!("sources.errors", "source" => source).increment(1);
            if e.is_timeout() {
                HallucheckError::Timeout(format!("{}: {}", source, e))
            } else {
                error(format!("{}: {}", source, e))
            }
        })
    }
}

/// `base` with `segment` appended as a single percent-encoded path segment,
/// so identifiers containing `/`, `?` or `#` stay intact.
pub(crate) fn join_segment(
    base: &str,
    segment: &str,
    source: &'static str,
    error: fn(String) -> HallucheckError,
) -> Result<reqwest::Url> {
    let mut url = reqwest::Url::parse(base)
        .map_err(|e| error(format!("{}: bad base URL {}: {}", source, base, e)))?;
    url.path_segments_mut()
        .map_err(|_| error(format!("{}: base URL {} cannot hold a path", source, base)))?
        .pop_if_empty()
        .push(segment);
    Ok(url)
}

/// Decode a JSON body, counting failures against `source`.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    source: &'static str,
    error: fn(String) -> HallucheckError,
) -> Result<T> {
    response.json::<T>().await.map_err(|e| {
        metrics::counter!("sources.errors", "source" => source).increment(1);
        error(format!("{}: failed to parse response: {}", source, e))
    })
}

/// Reject non-success statuses with the body text for context. A 429 from
/// the service becomes [`HallucheckError::RateLimited`].
pub(crate) async fn ensure_success(
    response: reqwest::Response,
    source: &'static str,
    error: fn(String) -> HallucheckError,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    metrics::counter!("sources.errors", "source" => source).increment(1);
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(HallucheckError::RateLimited(format!("{}: HTTP {}", source, status)));
    }
    let body = response.text().await.unwrap_or_default();
    let body: String = body.chars().take(200).collect();
    Err(error(format!("{}: HTTP {}: {}", source, status, body)))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Serve `router` on an ephemeral local port and return its base URL.
    pub async fn serve(router: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    pub fn context() -> HttpContext {
        HttpContext::new(
            reqwest::Client::new(),
            Arc::new(DomainRateLimiter::new(100.0)),
            Duration::from_secs(5),
        )
    }
}
