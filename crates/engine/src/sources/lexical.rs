use async_trait::async_trait;

use hallucheck_common::Result;

use super::Similarity;
use crate::verification::relevance::{content_words, word_set};

/// Model-free similarity: the share of the claim's content words that
/// appear in the evidence.
#[derive(Debug, Default, Clone, Copy)]
pub struct LexicalSimilarity;

#[async_trait]
impl Similarity for LexicalSimilarity {
    async fn similarity(&self, claim: &str, evidence: &str) -> Result<f64> {
        let claim_words = content_words(claim);
        if claim_words.is_empty() {
            return Ok(0.0);
        }
        let evidence_words = word_set(evidence);
        let hits = claim_words
            .iter()
            .filter(|w| evidence_words.contains(w.as_str()))
            .count();
        Ok(hits as f64 / claim_words.len() as f64)
    }
}
