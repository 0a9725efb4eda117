use std::sync::Arc;

use serde_json::json;

use hallucheck_common::types::{
    AuthorYear, BibRecord, Citation, CitationType, CitationVerification,
    PAGE_RELEVANCE_THRESHOLD, RECORD_RELEVANCE_THRESHOLD,
};

use super::relevance::{page_relevance, paper_relevance, unreadable_page_relevance};
use crate::sources::{Bibliography, Reachability};

/// Jaro-Winkler similarity at which a cited surname matches an author's
/// last name despite spelling drift.
const SURNAME_SIMILARITY: f64 = 0.92;

/// Routes each citation to the strategy for its type.
pub struct CitationVerifier {
    /// Tried in order for DOI lookups.
    doi_sources: Vec<Arc<dyn Bibliography>>,
    /// Tried in order for author-year searches.
    author_year_sources: Vec<Arc<dyn Bibliography>>,
    reachability: Arc<dyn Reachability>,
}

impl CitationVerifier {
    pub fn new(
        doi_sources: Vec<Arc<dyn Bibliography>>,
        author_year_sources: Vec<Arc<dyn Bibliography>>,
        reachability: Arc<dyn Reachability>,
    ) -> Self {
        Self {
            doi_sources,
            author_year_sources,
            reachability,
        }
    }

    /// Verify citations one at a time, in order. `claim_texts[i]` is the
    /// claim text `citations[i]` is scored against.
    pub async fn verify_all(
        &self,
        citations: &[Citation],
        claim_texts: &[&str],
    ) -> Vec<CitationVerification> {
        let mut results = Vec::with_capacity(citations.len());
        for (index, citation) in citations.iter().enumerate() {
            let claim_text = claim_texts.get(index).copied().unwrap_or("");
            results.push(self.verify(citation, claim_text).await);
        }
        results
    }

    pub async fn verify(&self, citation: &Citation, claim_text: &str) -> CitationVerification {
        let result = match citation.citation_type() {
            CitationType::Doi => self.verify_doi(citation, claim_text).await,
            CitationType::Url => self.verify_url(citation, claim_text).await,
            CitationType::Apa | CitationType::Mla => {
                self.verify_author_year(citation, claim_text).await
            }
            CitationType::Ieee => CitationVerification::unresolved(
                citation.clone(),
                "Numbered citations cannot be verified without the reference list",
            ),
        };

        metrics::counter!("verification.citation", "status" => result.status.as_str())
            .increment(1);
        tracing::debug!(
            citation = %citation.text,
            citation_type = %citation.citation_type(),
            status = result.status.as_str(),
            "Citation verified"
        );
        result
    }

    async fn verify_doi(&self, citation: &Citation, claim_text: &str) -> CitationVerification {
        let Some(doi) = citation.doi() else {
            return CitationVerification::unresolved(citation.clone(), "Missing DOI");
        };

        let mut errors = Vec::new();
        for source in &self.doi_sources {
            match source.lookup_doi(doi).await {
                Ok(Some(record)) => {
                    let relevance = paper_relevance(&record, claim_text);
                    return CitationVerification::found(
                        citation.clone(),
                        relevance,
                        RECORD_RELEVANCE_THRESHOLD,
                        json!({ "source": source.name(), "doi": doi }),
                        Some(record),
                    );
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(doi, source = source.name(), error = %e, "DOI lookup failed");
                    errors.push(format!("{}: {}", source.name(), e));
                }
            }
        }

        CitationVerification::not_found(
            citation.clone(),
            json!({ "error": "DOI not found in any bibliographic source", "lookup_errors": errors }),
        )
    }

    async fn verify_url(&self, citation: &Citation, claim_text: &str) -> CitationVerification {
        let url = citation.url().unwrap_or(&citation.text);

        match self.reachability.head_or_get(url).await {
            Ok(200) => {
                let relevance = match self.reachability.fetch_text(url).await {
                    Ok(page) => page_relevance(&page, claim_text),
                    Err(e) => {
                        tracing::warn!(url, error = %e, "Page body unavailable for relevance");
                        unreadable_page_relevance()
                    }
                };
                CitationVerification::found(
                    citation.clone(),
                    relevance,
                    PAGE_RELEVANCE_THRESHOLD,
                    json!({ "url": url, "status_code": 200 }),
                    None,
                )
            }
            Ok(status) => CitationVerification::inaccessible(
                citation.clone(),
                json!({ "url": url, "status_code": status, "error": "URL not accessible" }),
            ),
            Err(e) => {
                tracing::warn!(url, error = %e, "URL check failed");
                CitationVerification::not_found(
                    citation.clone(),
                    json!({ "url": url, "error": e.to_string() }),
                )
            }
        }
    }

    async fn verify_author_year(
        &self,
        citation: &Citation,
        claim_text: &str,
    ) -> CitationVerification {
        let Some(author_year) = citation.author_year() else {
            return CitationVerification::unresolved(citation.clone(), "Missing author or year");
        };
        let (Some(surname), Ok(year)) = (
            author_year.authors.first(),
            author_year.year.parse::<i32>(),
        ) else {
            return CitationVerification::unresolved(citation.clone(), "Missing author or year");
        };

        let mut errors = Vec::new();
        for source in &self.author_year_sources {
            match source.search_author_year(surname, &author_year.year).await {
                Ok(records) => {
                    if let Some((record, relevance)) =
                        best_match(records, author_year, year, claim_text)
                    {
                        return CitationVerification::found(
                            citation.clone(),
                            relevance,
                            RECORD_RELEVANCE_THRESHOLD,
                            json!({ "source": source.name() }),
                            Some(record),
                        );
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        citation = %citation.text,
                        source = source.name(),
                        error = %e,
                        "Author-year search failed"
                    );
                    errors.push(format!("{}: {}", source.name(), e));
                }
            }
        }

        CitationVerification::not_found(
            citation.clone(),
            json!({
                "error": "No matching publication found",
                "query": format!("{} {}", surname, author_year.year),
                "lookup_errors": errors,
            }),
        )
    }
}

/// The candidate with the highest positive relevance among those whose
/// year and authors agree with the citation. Ties keep the earlier record.
fn best_match(
    records: Vec<BibRecord>,
    cited: &AuthorYear,
    year: i32,
    claim_text: &str,
) -> Option<(BibRecord, f64)> {
    records
        .into_iter()
        .filter(|record| record.year == Some(year) && authors_match(&cited.authors, &record.authors))
        .map(|record| {
            let relevance = paper_relevance(&record, claim_text);
            (record, relevance)
        })
        .filter(|(_, relevance)| *relevance > 0.0)
        .fold(None, |best: Option<(BibRecord, f64)>, candidate| match best {
            Some(ref b) if b.1 >= candidate.1 => best,
            _ => Some(candidate),
        })
}

/// Whether any cited surname names one of the record's authors.
fn authors_match(surnames: &[String], authors: &[String]) -> bool {
    surnames.iter().any(|surname| {
        let surname = surname.to_lowercase();
        authors.iter().any(|author| {
            let author = author.to_lowercase();
            let last_name = author.split_whitespace().last().unwrap_or("");
            author.contains(&surname)
                || strsim::jaro_winkler(&surname, last_name) >= SURNAME_SIMILARITY
        })
    })
}
