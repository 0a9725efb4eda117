use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CitationVerification, FactVerification, Span};
use crate::config::RiskThresholds;
use crate::ids::AnalysisId;

/// Overall risk tag of a report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Boundaries are inclusive on the lower tag: a score equal to
    /// `low_max` is still `low`.
    pub fn from_score(score: f64, thresholds: &RiskThresholds) -> Self {
        if score <= thresholds.low_max {
            Self::Low
        } else if score <= thresholds.medium_max {
            Self::Medium
        } else {
            Self::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    FakeCitation,
    IrrelevantCitation,
    BrokenLink,
    ContradictedClaim,
    UnverifiedClaim,
    WeakEvidence,
}

/// A user-facing finding derived from exactly one verification result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub severity: Severity,
    pub detail: String,
    pub location: Span,
    pub recommendation: String,
}

/// Every per-item verification result, kept for audit and debugging.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailedResults {
    pub citation_verifications: Vec<CitationVerification>,
    pub fact_verifications: Vec<FactVerification>,
}

/// Final output of one analysis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HallucinationReport {
    pub analysis_id: AnalysisId,
    pub generated_at: DateTime<Utc>,
    pub overall_risk: RiskLevel,
    /// Weighted composite in `[0, 100]`.
    pub risk_score: f64,
    pub total_claims: usize,
    pub total_citations: usize,
    pub verified_claims: usize,
    pub fake_citations: usize,
    pub unverified_claims: usize,
    pub contradicted_claims: usize,
    pub broken_links: usize,
    pub claims_with_citations: usize,
    pub claims_without_citations: usize,
    /// Citation issues first, then claim issues, each in extraction order.
    pub issues: Vec<Issue>,
    pub detailed_results: DetailedResults,
}
