use hallucheck_common::types::{
    CitationStatus, CitationType, CitationVerification, FactStatus, FactVerification, Issue,
    IssueType, Severity,
};

const CLAIM_PREVIEW_CHARS: usize = 100;

/// Whether a URL citation was checked and found unreachable.
pub fn is_broken_link(result: &CitationVerification) -> bool {
    result.citation.citation_type() == CitationType::Url
        && !result.accessible
        && result.status != CitationStatus::Unknown
}

/// At most one issue per citation; fake outranks irrelevant outranks
/// broken link.
pub fn citation_issue(result: &CitationVerification) -> Option<Issue> {
    let citation = &result.citation;
    let (issue_type, severity, detail, recommendation) = match result.status {
        CitationStatus::Fake => (
            IssueType::FakeCitation,
            Severity::High,
            format!("Citation '{}' not found in any academic database", citation.text),
            "Verify the citation manually or remove it if unverifiable",
        ),
        CitationStatus::Irrelevant => (
            IssueType::IrrelevantCitation,
            Severity::Medium,
            format!("Citation '{}' exists but is not relevant to the claim", citation.text),
            "Find a more relevant citation or remove this one",
        ),
        _ if is_broken_link(result) => (
            IssueType::BrokenLink,
            Severity::Medium,
            format!(
                "URL '{}' is not accessible (404 or connection error)",
                citation.url().unwrap_or(&citation.text)
            ),
            "Update the URL or remove the broken link",
        ),
        _ => return None,
    };

    Some(Issue {
        issue_type,
        severity,
        detail,
        location: citation.span,
        recommendation: recommendation.into(),
    })
}

/// At most one issue per claim: contradicted, unsupported, or weakly
/// supported.
pub fn fact_issue(result: &FactVerification) -> Option<Issue> {
    let preview = claim_preview(&result.claim.text);
    let (issue_type, severity, detail, recommendation) = match result.status {
        FactStatus::Contradicted => (
            IssueType::ContradictedClaim,
            Severity::High,
            format!("Claim '{}' contradicts available evidence", preview),
            "Review the claim and verify against reliable sources",
        ),
        FactStatus::NoEvidence => (
            IssueType::UnverifiedClaim,
            Severity::Medium,
            format!("Claim '{}' has no supporting evidence found", preview),
            "Provide citations or verify the claim independently",
        ),
        FactStatus::Weak => (
            IssueType::WeakEvidence,
            Severity::Low,
            format!("Claim '{}' has weak supporting evidence", preview),
            "Strengthen the claim with more reliable sources",
        ),
        FactStatus::Supported | FactStatus::Unknown => return None,
    };

    Some(Issue {
        issue_type,
        severity,
        detail,
        location: result.claim.span,
        recommendation: recommendation.into(),
    })
}

/// Citation issues in citation order, then claim issues in claim order.
pub fn collect_issues(
    citation_results: &[CitationVerification],
    fact_results: &[FactVerification],
) -> Vec<Issue> {
    citation_results
        .iter()
        .filter_map(citation_issue)
        .chain(fact_results.iter().filter_map(fact_issue))
        .collect()
}

fn claim_preview(text: &str) -> String {
    match text.char_indices().nth(CLAIM_PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
