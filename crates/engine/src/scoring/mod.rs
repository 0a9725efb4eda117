//! Aggregation of verification results into a scored report.

mod issues;

pub use issues::{citation_issue, collect_issues, fact_issue, is_broken_link};

use chrono::Utc;

use hallucheck_common::config::{RiskThresholds, ScoringWeights};
use hallucheck_common::types::{
    CitationStatus, CitationVerification, Claim, Citation, DetailedResults, FactStatus,
    FactVerification, HallucinationReport, RiskLevel, Span,
};
use hallucheck_common::{AnalysisId, HallucheckError, Result};

use crate::pairing::ClaimCitationPair;

/// Weight of the contradicted-claim share. Not configurable.
pub const CONTRADICTION_WEIGHT: f64 = 0.3;

/// Outcome counts that feed the risk score. `unknown` results count
/// nowhere.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Counters {
    pub verified_claims: usize,
    pub unverified_claims: usize,
    pub contradicted_claims: usize,
    pub fake_citations: usize,
    pub broken_links: usize,
}

impl Counters {
    pub fn tally(
        citation_results: &[CitationVerification],
        fact_results: &[FactVerification],
    ) -> Self {
        let mut counters = Self::default();

        for result in fact_results {
            match result.status {
                FactStatus::Supported => counters.verified_claims += 1,
                FactStatus::NoEvidence | FactStatus::Weak => counters.unverified_claims += 1,
                FactStatus::Contradicted => counters.contradicted_claims += 1,
                FactStatus::Unknown => {}
            }
        }

        for result in citation_results {
            if result.status == CitationStatus::Fake {
                counters.fake_citations += 1;
            }
            if is_broken_link(result) {
                counters.broken_links += 1;
            }
        }

        counters
    }

    /// Weighted composite in `[0, 100]`. Zero when there are no claims.
    pub fn risk_score(&self, total_claims: usize, weights: &ScoringWeights) -> f64 {
        if total_claims == 0 {
            return 0.0;
        }
        let n = total_claims as f64;
        let composite = weights.unverified_weight * (self.unverified_claims as f64 / n)
            + weights.fake_citation_weight * (self.fake_citations as f64 / n)
            + weights.broken_link_weight * (self.broken_links as f64 / n)
            + CONTRADICTION_WEIGHT * (self.contradicted_claims as f64 / n);
        (composite * 100.0).min(100.0)
    }
}

/// Everything one analysis produced, ready to be scored.
pub struct ScoringInput<'a> {
    pub analysis_id: AnalysisId,
    pub text: &'a str,
    pub claims: &'a [Claim],
    pub citations: &'a [Citation],
    pub pairs: &'a [ClaimCitationPair<'a>],
    pub citation_results: Vec<CitationVerification>,
    pub fact_results: Vec<FactVerification>,
}

/// Builds reports from verification results.
pub struct Scorer {
    weights: ScoringWeights,
    thresholds: RiskThresholds,
}

impl Scorer {
    pub fn new(weights: ScoringWeights, thresholds: RiskThresholds) -> Self {
        Self {
            weights,
            thresholds,
        }
    }

    /// Fails with [`HallucheckError::Internal`] when the results are
    /// inconsistent with the extracted items; no partial report is built.
    pub fn generate_report(&self, input: ScoringInput<'_>) -> Result<HallucinationReport> {
        validate(&input)?;

        let counters = Counters::tally(&input.citation_results, &input.fact_results);
        let total_claims = input.claims.len();
        let risk_score = counters.risk_score(total_claims, &self.weights);
        let claims_with_citations = input.pairs.iter().filter(|p| p.is_paired()).count();
        let issues = collect_issues(&input.citation_results, &input.fact_results);

        Ok(HallucinationReport {
            analysis_id: input.analysis_id,
            generated_at: Utc::now(),
            overall_risk: RiskLevel::from_score(risk_score, &self.thresholds),
            risk_score,
            total_claims,
            total_citations: input.citations.len(),
            verified_claims: counters.verified_claims,
            fake_citations: counters.fake_citations,
            unverified_claims: counters.unverified_claims,
            contradicted_claims: counters.contradicted_claims,
            broken_links: counters.broken_links,
            claims_with_citations,
            claims_without_citations: total_claims - claims_with_citations,
            issues,
            detailed_results: DetailedResults {
                citation_verifications: input.citation_results,
                fact_verifications: input.fact_results,
            },
        })
    }
}

fn validate(input: &ScoringInput<'_>) -> Result<()> {
    let mut errors = Vec::new();

    if input.citation_results.len() != input.citations.len() {
        errors.push(format!(
            "{} citation results for {} citations",
            input.citation_results.len(),
            input.citations.len()
        ));
    }
    if input.fact_results.len() != input.claims.len() {
        errors.push(format!(
            "{} fact results for {} claims",
            input.fact_results.len(),
            input.claims.len()
        ));
    }
    if input.pairs.len() != input.claims.len() {
        errors.push(format!(
            "{} pairs for {} claims",
            input.pairs.len(),
            input.claims.len()
        ));
    }

    let char_len = input.text.chars().count();
    let check_span = |what: &str, span: Span, errors: &mut Vec<String>| {
        if !span.fits(char_len) {
            errors.push(format!("{} span {}..{} outside input", what, span.start, span.end));
        }
    };
    let check_score = |what: &str, score: f64, errors: &mut Vec<String>| {
        if !score.is_finite() || !(0.0..=1.0).contains(&score) {
            errors.push(format!("{} score {} outside [0, 1]", what, score));
        }
    };

    for claim in input.claims {
        check_span("claim", claim.span, &mut errors);
        check_score("claim confidence", claim.confidence, &mut errors);
    }
    for citation in input.citations {
        check_span("citation", citation.span, &mut errors);
    }
    for result in &input.citation_results {
        check_score("relevance", result.relevance_score, &mut errors);
    }
    for result in &input.fact_results {
        check_score("evidence", result.evidence_score, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(HallucheckError::Internal(format!(
            "inconsistent verification results: {}",
            errors.join("; ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pairing::pair_claims;
    use hallucheck_common::types::{CitationKind, IssueType};
    use proptest::prelude::*;
    use serde_json::Value;

    const TEXT: &str = "Water boils at 99.97 degrees doi:10.1/x. The Eiffel Tower is 330 m tall.";

    fn claims() -> Vec<Claim> {
        vec![
            Claim::new(TEXT[..40].into(), Span::new(0, 40), true, false),
            Claim::new(TEXT[41..].into(), Span::new(41, TEXT.len()), true, true),
        ]
    }

    fn citations() -> Vec<Citation> {
        vec![Citation::new(
            "doi:10.1/x",
            CitationKind::Doi {
                doi: "10.1/x".into(),
            },
            Span::new(29, 39),
        )]
    }

    fn scorer() -> Scorer {
        Scorer::new(ScoringWeights::default(), RiskThresholds::default())
    }

    #[test]
    fn test_risk_score_formula() {
        let counters = Counters {
            verified_claims: 1,
            unverified_claims: 2,
            contradicted_claims: 1,
            fake_citations: 1,
            broken_links: 0,
        };
        // 0.4 * 2/4 + 0.4 * 1/4 + 0.3 * 1/4 = 0.375
        let score = counters.risk_score(4, &ScoringWeights::default());
        assert!((score - 37.5).abs() < 1e-9);
    }

    #[test]
    fn test_risk_score_is_capped_and_zero_without_claims() {
        let counters = Counters {
            fake_citations: 10,
            broken_links: 10,
            unverified_claims: 1,
            ..Default::default()
        };
        assert_eq!(counters.risk_score(1, &ScoringWeights::default()), 100.0);
        assert_eq!(counters.risk_score(0, &ScoringWeights::default()), 0.0);
    }

    #[test]
    fn test_unknown_counts_nowhere() {
        let claims = claims();
        let facts: Vec<FactVerification> =
            claims.iter().cloned().map(FactVerification::skipped).collect();
        let cites: Vec<CitationVerification> =
            citations().into_iter().map(CitationVerification::skipped).collect();
        assert_eq!(Counters::tally(&cites, &facts), Counters::default());
    }

    #[test]
    fn test_generate_report() {
        let claims = claims();
        let citations = citations();
        let pairs = pair_claims(&claims, &citations);
        let report = scorer()
            .generate_report(ScoringInput {
                analysis_id: AnalysisId::new(),
                text: TEXT,
                claims: &claims,
                citations: &citations,
                pairs: &pairs,
                citation_results: vec![CitationVerification::not_found(
                    citations[0].clone(),
                    Value::Null,
                )],
                fact_results: vec![
                    FactVerification::scored(claims[0].clone(), 0.9, None, vec![]),
                    FactVerification::no_evidence(claims[1].clone(), None),
                ],
            })
            .unwrap();

        assert_eq!(report.total_claims, 2);
        assert_eq!(report.total_citations, 1);
        assert_eq!(report.verified_claims, 1);
        assert_eq!(report.unverified_claims, 1);
        assert_eq!(report.fake_citations, 1);
        assert_eq!(report.claims_with_citations, 2);
        assert_eq!(report.claims_without_citations, 0);
        // 0.4 * 1/2 + 0.4 * 1/2 = 0.4
        assert!((report.risk_score - 40.0).abs() < 1e-9);
        assert_eq!(report.overall_risk, RiskLevel::Medium);
        let kinds: Vec<IssueType> = report.issues.iter().map(|i| i.issue_type).collect();
        assert_eq!(kinds, vec![IssueType::FakeCitation, IssueType::UnverifiedClaim]);
    }

    #[test]
    fn test_count_mismatch_is_internal_error() {
        let claims = claims();
        let citations = citations();
        let pairs = pair_claims(&claims, &citations);
        let err = scorer()
            .generate_report(ScoringInput {
                analysis_id: AnalysisId::new(),
                text: TEXT,
                claims: &claims,
                citations: &citations,
                pairs: &pairs,
                citation_results: vec![],
                fact_results: vec![],
            })
            .unwrap_err();
        assert!(matches!(err, HallucheckError::Internal(_)));
    }

    #[test]
    fn test_out_of_range_score_is_internal_error() {
        let claims = claims();
        let citations = citations();
        let pairs = pair_claims(&claims, &citations);
        let mut bad = FactVerification::scored(claims[0].clone(), 0.9, None, vec![]);
        bad.evidence_score = f64::NAN;
        let err = scorer()
            .generate_report(ScoringInput {
                analysis_id: AnalysisId::new(),
                text: TEXT,
                claims: &claims,
                citations: &citations,
                pairs: &pairs,
                citation_results: citations
                    .iter()
                    .cloned()
                    .map(CitationVerification::skipped)
                    .collect(),
                fact_results: vec![bad, FactVerification::skipped(claims[1].clone())],
            })
            .unwrap_err();
        assert!(err.to_string().contains("evidence score NaN"));
    }

    #[test]
    fn test_span_outside_text_is_internal_error() {
        let claims = vec![Claim::new("x".into(), Span::new(500, 501), true, false)];
        let pairs = pair_claims(&claims, &[]);
        let err = scorer()
            .generate_report(ScoringInput {
                analysis_id: AnalysisId::new(),
                text: "short",
                claims: &claims,
                citations: &[],
                pairs: &pairs,
                citation_results: vec![],
                fact_results: vec![FactVerification::skipped(claims[0].clone())],
            })
            .unwrap_err();
        assert!(matches!(err, HallucheckError::Internal(_)));
    }

    fn fact_score() -> impl Strategy<Value = f64> {
        prop_oneof![Just(-1.0), 0.0..=1.0f64]
    }

    proptest! {
        /// Issues never outnumber the results they come from.
        #[test]
        fn prop_issue_count_bounded(
            scores in proptest::collection::vec(fact_score(), 0..12),
            fakes in proptest::collection::vec(any::<bool>(), 0..12),
        ) {
            let claim = Claim::new("c".into(), Span::new(0, 1), true, false);
            let facts: Vec<FactVerification> = scores
                .iter()
                .map(|&s| if s < 0.0 {
                    FactVerification::skipped(claim.clone())
                } else {
                    FactVerification::scored(claim.clone(), s, None, vec![])
                })
                .collect();
            let cites: Vec<CitationVerification> = fakes
                .iter()
                .map(|&fake| {
                    let c = citations().remove(0);
                    if fake {
                        CitationVerification::not_found(c, Value::Null)
                    } else {
                        CitationVerification::skipped(c)
                    }
                })
                .collect();

            let issues = collect_issues(&cites, &facts);
            prop_assert!(issues.len() <= cites.len() + facts.len());

            let counters = Counters::tally(&cites, &facts);
            let score = counters.risk_score(facts.len(), &ScoringWeights::default());
            prop_assert!((0.0..=100.0).contains(&score));
        }
    }
}
