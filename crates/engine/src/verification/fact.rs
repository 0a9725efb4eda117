use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};

use hallucheck_common::types::{Claim, FactVerification};
use hallucheck_common::{HallucheckError, Result};

use super::evidence::EvidenceRetriever;
use super::query::SearchQueryBuilder;
use crate::sources::{Entailment, Similarity};

/// Contradiction probability above which a source counts as contradicting.
const CONTRADICTION_THRESHOLD: f64 = 0.5;
const MEAN_WEIGHT: f64 = 0.6;
const MAX_WEIGHT: f64 = 0.4;

/// Checks claims against retrieved evidence.
pub struct FactVerifier {
    retriever: EvidenceRetriever,
    similarity: Arc<dyn Similarity>,
    entailment: Arc<dyn Entailment>,
    queries: SearchQueryBuilder,
    concurrency: usize,
}

impl FactVerifier {
    pub fn new(
        retriever: EvidenceRetriever,
        similarity: Arc<dyn Similarity>,
        entailment: Arc<dyn Entailment>,
        concurrency: usize,
    ) -> Self {
        Self {
            retriever,
            similarity,
            entailment,
            queries: SearchQueryBuilder::new(),
            concurrency: concurrency.max(1),
        }
    }

    /// Results come back in claim order even though up to `concurrency`
    /// claims are in flight at once.
    pub async fn verify_all(&self, claims: &[Claim]) -> Vec<FactVerification> {
        // Boxed so the returned future is `Send` for every borrow of `claims`.
        let pending: Vec<BoxFuture<'_, FactVerification>> = claims
            .iter()
            .map(|claim| Box::pin(self.verify(claim)) as BoxFuture<'_, FactVerification>)
            .collect();
        stream::iter(pending)
            .buffered(self.concurrency)
            .collect()
            .await
    }

    /// Never fails: collaborator errors degrade the claim to `no_evidence`.
    pub async fn verify(&self, claim: &Claim) -> FactVerification {
        let result = match self.score(claim).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(claim = %claim.text, error = %e, "Fact verification failed");
                FactVerification::no_evidence(claim.clone(), Some(e.to_string()))
            }
        };

        metrics::counter!("verification.fact", "status" => result.status.as_str()).increment(1);
        result
    }

    async fn score(&self, claim: &Claim) -> Result<FactVerification> {
        let query = self.queries.build(&claim.text);
        let evidence = self.retriever.retrieve(&query).await?;
        if evidence.is_empty() {
            return Ok(FactVerification::no_evidence(
                claim.clone(),
                Some(format!("No evidence found for query '{}'", query)),
            ));
        }

        let texts: Vec<&str> = evidence
            .iter()
            .map(|e| e.text.as_str())
            .filter(|t| !t.trim().is_empty())
            .collect();

        let mut contradicting = 0usize;
        for text in &texts {
            let scores = self.entailment.classify(&claim.text, text).await?;
            if scores.contradiction > CONTRADICTION_THRESHOLD {
                contradicting += 1;
            }
        }

        let similarities = self.similarity.similarities(&claim.text, &texts).await?;
        let evidence_score = combine(&similarities)?;

        tracing::debug!(
            claim = %claim.text,
            sources = texts.len(),
            evidence_score,
            contradicting,
            "Claim scored"
        );

        let contradiction_details = (contradicting > 0)
            .then(|| format!("Contradiction found in {} source(s)", contradicting));
        Ok(FactVerification::scored(
            claim.clone(),
            evidence_score,
            contradiction_details,
            evidence,
        ))
    }
}

/// `0.6 * mean + 0.4 * max`, or 0.0 for no scores.
fn combine(similarities: &[f64]) -> Result<f64> {
    if similarities.is_empty() {
        return Ok(0.0);
    }
    if let Some(bad) = similarities.iter().find(|s| !s.is_finite()) {
        return Err(HallucheckError::Similarity(format!(
            "non-finite similarity {}",
            bad
        )));
    }

    let clamped: Vec<f64> = similarities.iter().map(|s| s.clamp(0.0, 1.0)).collect();
    let mean = clamped.iter().sum::<f64>() / clamped.len() as f64;
    let max = clamped.iter().copied().fold(0.0, f64::max);
    Ok(MEAN_WEIGHT * mean + MAX_WEIGHT * max)
}
