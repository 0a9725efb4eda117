//! End-to-end analysis: extract, pair, verify, score.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::Instrument;

use hallucheck_common::config::SystemConfig;
use hallucheck_common::types::{CitationVerification, FactVerification, HallucinationReport};
use hallucheck_common::{AnalysisId, HallucheckError, Result};

use crate::extraction::{HeuristicTagger, SentenceTagger, TextExtractor};
use crate::pairing::{claim_text_by_citation, pair_claims};
use crate::scoring::{Scorer, ScoringInput};
use crate::sources::{
    Bibliography, CrossrefClient, DomainRateLimiter, EmbeddingSimilarity, Entailment,
    EvidenceSource, HttpContext, HttpEntailment, HttpReachability, LexicalSimilarity,
    NeutralEntailment, SemanticScholarClient, Similarity, WikipediaClient,
};
use crate::verification::{CitationVerifier, EvidenceRetriever, FactVerifier};

/// The classifier is a local model server, not a shared public API.
const ENTAILMENT_RATE_PER_SECOND: f64 = 100.0;

/// Runs analyses. Holds only immutable configuration and shared clients, so
/// one instance serves concurrent requests.
pub struct Analyzer {
    tagger: Arc<dyn SentenceTagger>,
    extractor: TextExtractor,
    citations: CitationVerifier,
    facts: FactVerifier,
    scorer: Scorer,
}

impl Analyzer {
    pub fn new(
        tagger: Arc<dyn SentenceTagger>,
        citations: CitationVerifier,
        facts: FactVerifier,
        scorer: Scorer,
    ) -> Self {
        Self {
            tagger,
            extractor: TextExtractor::new(),
            citations,
            facts,
            scorer,
        }
    }

    /// Wire the HTTP-backed collaborators described by `config`.
    pub fn from_config(config: &SystemConfig) -> Result<Self> {
        let services = &config.services;
        let http = reqwest::Client::builder()
            .user_agent(services.user_agent.clone())
            .build()
            .map_err(|e| HallucheckError::Config(format!("failed to build HTTP client: {}", e)))?;

        let limiter = Arc::new(DomainRateLimiter::new(services.rate_limit_per_second));
        let lookup_ctx = HttpContext::new(
            http.clone(),
            limiter.clone(),
            Duration::from_millis(services.request_timeout_ms),
        );
        let evidence_ctx = HttpContext::new(
            http.clone(),
            limiter,
            Duration::from_millis(services.evidence_timeout_ms),
        );

        let crossref: Arc<dyn Bibliography> =
            Arc::new(CrossrefClient::new(lookup_ctx.clone(), &services.crossref_url));
        let scholar: Arc<dyn Bibliography> = Arc::new(SemanticScholarClient::new(
            lookup_ctx.clone(),
            &services.semantic_scholar_url,
        ));
        let citations = CitationVerifier::new(
            vec![crossref.clone(), scholar.clone()],
            vec![scholar, crossref],
            Arc::new(HttpReachability::new(lookup_ctx)),
        );

        let evidence_sources: Vec<Arc<dyn EvidenceSource>> = vec![
            Arc::new(WikipediaClient::new(evidence_ctx.clone(), &services.wikipedia_url)),
            Arc::new(SemanticScholarClient::new(
                evidence_ctx.clone(),
                &services.semantic_scholar_url,
            )),
        ];

        let similarity: Arc<dyn Similarity> = match config
            .embeddings
            .clone()
            .and_then(|e| {
                EmbeddingSimilarity::new(
                    http.clone(),
                    e,
                    config.retry.clone(),
                    Duration::from_millis(services.evidence_timeout_ms),
                )
            })
        {
            Some(embeddings) => {
                tracing::info!("Using embedding similarity");
                Arc::new(embeddings)
            }
            None => {
                tracing::info!("Using lexical similarity");
                Arc::new(LexicalSimilarity)
            }
        };

        let entailment: Arc<dyn Entailment> = match &services.entailment_url {
            Some(url) => {
                let ctx = HttpContext::new(
                    http,
                    Arc::new(DomainRateLimiter::new(ENTAILMENT_RATE_PER_SECOND)),
                    evidence_ctx.timeout,
                );
                Arc::new(HttpEntailment::new(ctx, url))
            }
            None => {
                tracing::info!("No entailment classifier configured, contradiction detection off");
                Arc::new(NeutralEntailment)
            }
        };

        let facts = FactVerifier::new(
            EvidenceRetriever::new(
                evidence_sources,
                config.verification.max_evidence_results as usize,
            ),
            similarity,
            entailment,
            config.verification.fact_concurrency as usize,
        );

        Ok(Self::new(
            Arc::new(HeuristicTagger),
            citations,
            facts,
            Scorer::new(config.scoring.clone(), config.risk.clone()),
        ))
    }

    /// Analyze `text` and produce a scored report.
    ///
    /// Disabled verification marks every item `unknown` and skipped.
    /// Collaborator failures degrade single items; only inconsistent results
    /// fail the whole analysis.
    pub async fn analyze_and_score(
        &self,
        text: &str,
        verify_citations: bool,
        verify_facts: bool,
    ) -> Result<HallucinationReport> {
        let analysis_id = AnalysisId::new();
        let span = tracing::info_span!("analysis", analysis_id = %analysis_id);
        self.run(analysis_id, text, verify_citations, verify_facts)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        analysis_id: AnalysisId,
        text: &str,
        verify_citations: bool,
        verify_facts: bool,
    ) -> Result<HallucinationReport> {
        let start = Instant::now();
        metrics::counter!("analysis.requests").increment(1);
        tracing::info!(
            chars = text.chars().count(),
            verify_citations,
            verify_facts,
            "Analysis started"
        );

        let extraction = self.extractor.extract(text, self.tagger.as_ref());
        let pairs = pair_claims(&extraction.claims, &extraction.citations);
        let claim_texts = claim_text_by_citation(&pairs, extraction.citations.len());

        let citation_work = async {
            if verify_citations {
                self.citations
                    .verify_all(&extraction.citations, &claim_texts)
                    .await
            } else {
                extraction
                    .citations
                    .iter()
                    .cloned()
                    .map(CitationVerification::skipped)
                    .collect()
            }
        };
        let fact_work = async {
            if verify_facts {
                self.facts.verify_all(&extraction.claims).await
            } else {
                extraction
                    .claims
                    .iter()
                    .cloned()
                    .map(FactVerification::skipped)
                    .collect()
            }
        };
        let (citation_results, fact_results) = tokio::join!(citation_work, fact_work);

        let report = self.scorer.generate_report(ScoringInput {
            analysis_id,
            text,
            claims: &extraction.claims,
            citations: &extraction.citations,
            pairs: &pairs,
            citation_results,
            fact_results,
        });

        let elapsed = start.elapsed().as_secs_f64();
        metrics::histogram!("analysis.latency").record(elapsed);

        match report {
            Ok(report) => {
                metrics::histogram!("analysis.risk_score").record(report.risk_score);
                tracing::info!(
                    claims = report.total_claims,
                    citations = report.total_citations,
                    issues = report.issues.len(),
                    risk_score = report.risk_score,
                    overall_risk = report.overall_risk.as_str(),
                    elapsed_s = elapsed,
                    "Analysis complete"
                );
                Ok(report)
            }
            Err(e) => {
                metrics::counter!("analysis.failures").increment(1);
                tracing::error!(error = %e, "Analysis failed");
                Err(e)
            }
        }
    }
}
