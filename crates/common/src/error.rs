use thiserror::Error;

/// Top-level error type for hallucination analysis.
#[derive(Debug, Error)]
pub enum HallucheckError {
    // --- Soft dependency errors (absorbed per item, never fail an analysis) ---
    #[error("Bibliography lookup error: {0}")]
    Bibliography(String),

    #[error("Reachability check error: {0}")]
    Reachability(String),

    #[error("Evidence retrieval error: {0}")]
    Evidence(String),

    #[error("Similarity scoring error: {0}")]
    Similarity(String),

    #[error("Entailment classifier error: {0}")]
    Entailment(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    // --- Operational errors ---
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    Internal(String),
}

impl HallucheckError {
    /// Whether the caller sent something we refuse to analyze.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Result type alias for hallucination analysis.
pub type Result<T> = std::result::Result<T, HallucheckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(HallucheckError::Validation("empty".into()).is_client_error());
        assert!(!HallucheckError::Timeout("slow".into()).is_client_error());
        assert!(!HallucheckError::Internal("boom".into()).is_client_error());
        assert!(!HallucheckError::Config("bad".into()).is_client_error());
    }
}
