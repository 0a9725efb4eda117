use serde::{Deserialize, Serialize};

/// Top-level system configuration, deserialized from system.toml.
///
/// Read-only after startup. Every section has defaults so a partial file
/// (or none at all, in tests) still yields a usable configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub scoring: ScoringWeights,
    pub risk: RiskThresholds,
    pub verification: VerificationConfig,
    pub services: ServicesConfig,
    /// Embedding-backed similarity. Lexical similarity is used when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<EmbeddingConfig>,
    pub retry: RetryConfig,
}

impl SystemConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Weights of the risk score components. Contradictions carry a fixed
/// weight of 0.3 that is not configurable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub unverified_weight: f64,
    pub fake_citation_weight: f64,
    pub broken_link_weight: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            unverified_weight: 0.4,
            fake_citation_weight: 0.4,
            broken_link_weight: 0.2,
        }
    }
}

/// Upper bounds (inclusive) of the `low` and `medium` risk tags.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    pub low_max: f64,
    pub medium_max: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            low_max: 30.0,
            medium_max: 60.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Claims verified concurrently within one analysis.
    pub fact_concurrency: u32,
    /// Cap on the unioned evidence records per claim.
    pub max_evidence_results: u32,
    /// Requests with longer text are rejected at the HTTP boundary.
    pub max_input_chars: u32,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            fact_concurrency: 4,
            max_evidence_results: 5,
            max_input_chars: 50_000,
        }
    }
}

/// Endpoints and politeness settings for outbound calls.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    pub user_agent: String,
    /// Per-call timeout for bibliographic and URL checks.
    pub request_timeout_ms: u64,
    /// Per-call timeout for evidence retrieval.
    pub evidence_timeout_ms: u64,
    /// Requests per second allowed against each external service.
    pub rate_limit_per_second: f64,
    pub crossref_url: String,
    pub semantic_scholar_url: String,
    pub wikipedia_url: String,
    /// Entailment classifier endpoint. Contradiction detection is off without it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entailment_url: Option<String>,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            user_agent: "Hallucheck/0.1".into(),
            request_timeout_ms: 10_000,
            evidence_timeout_ms: 5_000,
            rate_limit_per_second: 2.0,
            crossref_url: "https://api.crossref.org/works".into(),
            semantic_scholar_url: "https://api.semanticscholar.org/graph/v1".into(),
            wikipedia_url: "https://en.wikipedia.org".into(),
            entailment_url: None,
        }
    }
}

/// OpenAI-compatible embeddings API used for semantic similarity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub endpoint: String,
    /// Model identifier (e.g. "text-embedding-3-small").
    pub model: String,
    /// Embedding vector dimensions.
    pub dimensions: u32,
}

/// Retry configuration for model-backed collaborators.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 5_000,
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}
