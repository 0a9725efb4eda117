use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{Citation, Claim};

/// Relevance a bibliographic match must exceed to count as verified.
pub const RECORD_RELEVANCE_THRESHOLD: f64 = 0.5;
/// Relevance a reachable web page must exceed to count as verified.
pub const PAGE_RELEVANCE_THRESHOLD: f64 = 0.3;
/// Evidence score above which a claim is supported.
pub const SUPPORTED_EVIDENCE_THRESHOLD: f64 = 0.7;
/// Evidence score above which a claim has weak support.
pub const WEAK_EVIDENCE_THRESHOLD: f64 = 0.4;
/// Evidence score above which the `supported` flag is set.
pub const SUPPORTED_FLAG_THRESHOLD: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CitationStatus {
    Verified,
    Fake,
    Irrelevant,
    Unknown,
}

impl CitationStatus {
    /// Status of an attempted check: `fake` when nothing was found,
    /// `irrelevant` when the match does not clear `threshold`.
    pub fn classify(found: bool, relevance: f64, threshold: f64) -> Self {
        if !found {
            Self::Fake
        } else if relevance <= threshold {
            Self::Irrelevant
        } else {
            Self::Verified
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::Fake => "fake",
            Self::Irrelevant => "irrelevant",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactStatus {
    Supported,
    Contradicted,
    Weak,
    NoEvidence,
    Unknown,
}

impl FactStatus {
    /// Contradiction wins over any evidence score.
    pub fn classify(contradiction: bool, evidence_score: f64) -> Self {
        if contradiction {
            Self::Contradicted
        } else if evidence_score > SUPPORTED_EVIDENCE_THRESHOLD {
            Self::Supported
        } else if evidence_score > WEAK_EVIDENCE_THRESHOLD {
            Self::Weak
        } else {
            Self::NoEvidence
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Supported => "supported",
            Self::Contradicted => "contradicted",
            Self::Weak => "weak",
            Self::NoEvidence => "no_evidence",
            Self::Unknown => "unknown",
        }
    }
}

/// A bibliographic record normalized from any backing source.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BibRecord {
    /// Backend that produced the record ("crossref", "semantic_scholar").
    pub source: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "abstract")]
    pub abstract_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Outcome of checking one citation.
///
/// Built only through the constructors below so the status always agrees
/// with the flags and relevance score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CitationVerification {
    pub citation: Citation,
    pub exists: bool,
    pub accessible: bool,
    pub relevance_score: f64,
    pub status: CitationStatus,
    /// Free-form, backend-specific context.
    #[serde(default)]
    pub details: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_record: Option<BibRecord>,
    #[serde(default)]
    pub skipped: bool,
}

impl CitationVerification {
    /// The cited work or page was found; status depends on relevance.
    pub fn found(
        citation: Citation,
        relevance: f64,
        threshold: f64,
        details: Value,
        matched_record: Option<BibRecord>,
    ) -> Self {
        Self {
            citation,
            exists: true,
            accessible: true,
            relevance_score: relevance,
            status: CitationStatus::classify(true, relevance, threshold),
            details,
            matched_record,
            skipped: false,
        }
    }

    /// The target answered but could not be retrieved (e.g. a 404 page).
    pub fn inaccessible(citation: Citation, details: Value) -> Self {
        Self {
            citation,
            exists: true,
            accessible: false,
            relevance_score: 0.0,
            status: CitationStatus::classify(false, 0.0, 0.0),
            details,
            matched_record: None,
            skipped: false,
        }
    }

    /// Nothing was found in any backing source, or every lookup failed.
    pub fn not_found(citation: Citation, details: Value) -> Self {
        Self {
            citation,
            exists: false,
            accessible: false,
            relevance_score: 0.0,
            status: CitationStatus::classify(false, 0.0, 0.0),
            details,
            matched_record: None,
            skipped: false,
        }
    }

    /// The citation cannot be resolved by any strategy.
    pub fn unresolved(citation: Citation, reason: &str) -> Self {
        Self {
            citation,
            exists: false,
            accessible: false,
            relevance_score: 0.0,
            status: CitationStatus::Unknown,
            details: json!({ "error": reason }),
            matched_record: None,
            skipped: false,
        }
    }

    /// Citation verification was disabled by the caller.
    pub fn skipped(citation: Citation) -> Self {
        Self {
            citation,
            exists: false,
            accessible: false,
            relevance_score: 0.0,
            status: CitationStatus::Unknown,
            details: json!({ "skipped": "Citation verification disabled" }),
            matched_record: None,
            skipped: true,
        }
    }
}

/// One piece of retrieved evidence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    /// Backend that produced the evidence ("wikipedia", "semantic_scholar").
    pub source: String,
    pub title: String,
    pub text: String,
    pub url: String,
}

/// Outcome of checking one claim against retrieved evidence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FactVerification {
    pub claim: Claim,
    pub supported: bool,
    pub contradiction: bool,
    pub evidence_score: f64,
    pub status: FactStatus,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contradiction_details: Option<String>,
    /// Why the claim could not be checked, when it could not.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default)]
    pub skipped: bool,
}

impl FactVerification {
    /// A claim scored against evidence. `contradiction_details` is set
    /// exactly when some evidence contradicts the claim.
    pub fn scored(
        claim: Claim,
        evidence_score: f64,
        contradiction_details: Option<String>,
        evidence: Vec<Evidence>,
    ) -> Self {
        let contradiction = contradiction_details.is_some();
        Self {
            claim,
            supported: evidence_score > SUPPORTED_FLAG_THRESHOLD && !contradiction,
            contradiction,
            evidence_score,
            status: FactStatus::classify(contradiction, evidence_score),
            evidence,
            contradiction_details,
            details: None,
            skipped: false,
        }
    }

    /// No usable evidence, either because none exists or because a lookup
    /// failed.
    pub fn no_evidence(claim: Claim, details: Option<String>) -> Self {
        Self {
            claim,
            supported: false,
            contradiction: false,
            evidence_score: 0.0,
            status: FactStatus::classify(false, 0.0),
            evidence: Vec::new(),
            contradiction_details: None,
            details,
            skipped: false,
        }
    }

    /// Fact verification was disabled by the caller.
    pub fn skipped(claim: Claim) -> Self {
        Self {
            claim,
            supported: false,
            contradiction: false,
            evidence_score: 0.0,
            status: FactStatus::Unknown,
            evidence: Vec::new(),
            contradiction_details: None,
            details: Some("Fact verification disabled".into()),
            skipped: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CitationKind, Span};

    fn claim() -> Claim {
        Claim::new("Water boils at 100 C.".into(), Span::new(0, 21), true, false)
    }

    fn doi_citation() -> Citation {
        Citation::new(
            "doi:10.1/x",
            CitationKind::Doi { doi: "10.1/x".into() },
            Span::new(22, 32),
        )
    }

    #[test]
    fn test_citation_classification_boundaries() {
        assert_eq!(CitationStatus::classify(false, 0.9, 0.5), CitationStatus::Fake);
        assert_eq!(
            CitationStatus::classify(true, 0.5, RECORD_RELEVANCE_THRESHOLD),
            CitationStatus::Irrelevant
        );
        assert_eq!(
            CitationStatus::classify(true, 0.51, RECORD_RELEVANCE_THRESHOLD),
            CitationStatus::Verified
        );
        assert_eq!(
            CitationStatus::classify(true, 0.3, PAGE_RELEVANCE_THRESHOLD),
            CitationStatus::Irrelevant
        );
        assert_eq!(
            CitationStatus::classify(true, 0.31, PAGE_RELEVANCE_THRESHOLD),
            CitationStatus::Verified
        );
    }

    #[test]
    fn test_fact_classification_boundaries() {
        assert_eq!(FactStatus::classify(true, 0.95), FactStatus::Contradicted);
        assert_eq!(FactStatus::classify(false, 0.71), FactStatus::Supported);
        assert_eq!(FactStatus::classify(false, 0.7), FactStatus::Weak);
        assert_eq!(FactStatus::classify(false, 0.41), FactStatus::Weak);
        assert_eq!(FactStatus::classify(false, 0.4), FactStatus::NoEvidence);
        assert_eq!(FactStatus::classify(false, 0.0), FactStatus::NoEvidence);
    }

    #[test]
    fn test_contradiction_overrides_high_evidence() {
        let result = FactVerification::scored(
            claim(),
            0.9,
            Some("Contradiction found in 1 source(s)".into()),
            Vec::new(),
        );
        assert_eq!(result.status, FactStatus::Contradicted);
        assert!(result.contradiction);
        assert!(!result.supported);
    }

    #[test]
    fn test_supported_flag_threshold() {
        let weakly = FactVerification::scored(claim(), 0.55, None, Vec::new());
        assert_eq!(weakly.status, FactStatus::Weak);
        assert!(weakly.supported);

        let barely = FactVerification::scored(claim(), 0.5, None, Vec::new());
        assert!(!barely.supported);
    }

    #[test]
    fn test_constructors_keep_status_consistent() {
        let inaccessible = CitationVerification::inaccessible(doi_citation(), Value::Null);
        assert!(inaccessible.exists && !inaccessible.accessible);
        assert_eq!(inaccessible.status, CitationStatus::Fake);

        let skipped = CitationVerification::skipped(doi_citation());
        assert!(skipped.skipped);
        assert_eq!(skipped.status, CitationStatus::Unknown);
        assert_eq!(skipped.details["skipped"], "Citation verification disabled");

        let skipped_fact = FactVerification::skipped(claim());
        assert_eq!(skipped_fact.status, FactStatus::Unknown);
        assert!(skipped_fact.skipped);
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_value(FactStatus::NoEvidence).unwrap(),
            "no_evidence"
        );
        assert_eq!(serde_json::to_value(CitationStatus::Fake).unwrap(), "fake");
        assert_eq!(FactStatus::NoEvidence.as_str(), "no_evidence");
    }
}
