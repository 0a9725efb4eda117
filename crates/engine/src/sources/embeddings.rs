use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use hallucheck_common::config::{EmbeddingConfig, RetryConfig};
use hallucheck_common::{HallucheckError, Result};

use super::Similarity;

/// Similarity from cosine distance between embeddings served by an
/// OpenAI-compatible `/v1/embeddings` endpoint.
pub struct EmbeddingSimilarity {
    http: reqwest::Client,
    config: EmbeddingConfig,
    retry: RetryConfig,
    api_key: String,
    /// Per-request deadline.
    timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
enum EmbeddingError {
    #[error("embedding API HTTP error: {0}")]
    Http(String),

    #[error("embedding API timed out after {0:?}")]
    Timeout(Duration),

    #[error("embedding API auth error: {0}")]
    Auth(String),

    #[error("embedding API rate limited (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: u32, got: usize },

    #[error("embedding API error: {0}")]
    Api(String),
}

impl EmbeddingError {
    fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::Auth(_) | Self::DimensionMismatch { .. } | Self::Timeout(_)
        )
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    dimensions: u32,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

impl EmbeddingSimilarity {
    /// Reads the API key from `OPENAI_API_KEY`. Returns `None` when it is
    /// unset so callers can fall back to lexical similarity.
    pub fn new(
        http: reqwest::Client,
        config: EmbeddingConfig,
        retry: RetryConfig,
        timeout: Duration,
    ) -> Option<Self> {
        let api_key = match std::env::var("OPENAI_API_KEY") {
            Ok(key) if !key.is_empty() => key,
            _ => {
                tracing::warn!("OPENAI_API_KEY not set, embedding similarity disabled");
                return None;
            }
        };
        Some(Self::with_api_key(http, config, retry, timeout, api_key))
    }

    pub fn with_api_key(
        http: reqwest::Client,
        config: EmbeddingConfig,
        retry: RetryConfig,
        timeout: Duration,
        api_key: String,
    ) -> Self {
        Self {
            http,
            config,
            retry,
            api_key,
            timeout,
        }
    }

    /// Embed texts in one request, retrying transient failures with
    /// exponential backoff.
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut attempt = 0u32;
        let mut backoff_ms = self.retry.initial_backoff_ms;

        loop {
            attempt += 1;
            let error = match self.call_api(texts).await {
                Ok(embeddings) => return Ok(embeddings),
                Err(e) => e,
            };

            if !error.is_retryable() || attempt >= self.retry.max_attempts {
                metrics::counter!("sources.errors", "source" => "embeddings").increment(1);
                let message = format!("{} (attempt {})", error, attempt);
                return Err(match error {
                    EmbeddingError::Timeout(_) => HallucheckError::Timeout(message),
                    EmbeddingError::RateLimited { .. } => HallucheckError::RateLimited(message),
                    _ => HallucheckError::Similarity(message),
                });
            }

            let wait = match error {
                EmbeddingError::RateLimited {
                    retry_after: Some(seconds),
                } => seconds.saturating_mul(1000).min(self.retry.max_backoff_ms),
                _ => backoff_ms + self.jitter(backoff_ms, attempt),
            };
            tracing::warn!(attempt, wait_ms = wait, error = %error, "Embedding API error, retrying");
            tokio::time::sleep(Duration::from_millis(wait)).await;

            backoff_ms = ((backoff_ms as f64 * self.retry.backoff_multiplier) as u64)
                .min(self.retry.max_backoff_ms);
        }
    }

    fn jitter(&self, backoff_ms: u64, attempt: u32) -> u64 {
        if !self.retry.jitter {
            return 0;
        }
        use std::hash::{Hash, Hasher};
        let mut hasher = std::hash::DefaultHasher::new();
        attempt.hash(&mut hasher);
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .subsec_nanos()
            .hash(&mut hasher);
        hasher.finish() % (backoff_ms / 2 + 1)
    }

    async fn call_api(&self, texts: &[&str]) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
        let start = std::time::Instant::now();
        let request = EmbeddingRequest {
            model: &self.config.model,
            input: texts,
            dimensions: self.config.dimensions,
        };

        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout(self.timeout)
                } else {
                    EmbeddingError::Http(e.to_string())
                }
            })?;

        metrics::histogram!("sources.latency", "source" => "embeddings")
            .record(start.elapsed().as_secs_f64());

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Auth(format!("{}: {}", status, body)));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            return Err(EmbeddingError::RateLimited { retry_after });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api(format!("{}: {}", status, body)));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Api(format!("failed to parse response: {}", e)))?;

        let mut data = body.data;
        data.sort_by_key(|d| d.index);
        if data.len() != texts.len() {
            return Err(EmbeddingError::Api(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                data.len()
            )));
        }
        if let Some(bad) = data
            .iter()
            .find(|d| d.embedding.len() != self.config.dimensions as usize)
        {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.config.dimensions,
                got: bad.embedding.len(),
            });
        }

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl Similarity for EmbeddingSimilarity {
    async fn similarity(&self, claim: &str, evidence: &str) -> Result<f64> {
        let scores = self.similarities(claim, &[evidence]).await?;
        Ok(scores.first().copied().unwrap_or(0.0))
    }

    /// One request for the claim and every text.
    async fn similarities(&self, claim: &str, texts: &[&str]) -> Result<Vec<f64>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut input = Vec::with_capacity(texts.len() + 1);
        input.push(claim);
        input.extend_from_slice(texts);

        let embeddings = self.embed(&input).await?;
        let (claim_vec, text_vecs) = embeddings
            .split_first()
            .ok_or_else(|| HallucheckError::Similarity("empty embedding response".into()))?;

        Ok(text_vecs
            .iter()
            .map(|v| cosine_similarity(claim_vec, v).clamp(0.0, 1.0))
            .collect())
    }
}

/// Cosine of the angle between two vectors; 0.0 when either is zero or the
/// lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (dot, norm_a, norm_b) = a.iter().zip(b).fold((0.0f64, 0.0f64, 0.0f64), |(d, na, nb), (&x, &y)| {
        let (x, y) = (x as f64, y as f64);
        (d + x * y, na + x * x, nb + y * y)
    });

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
