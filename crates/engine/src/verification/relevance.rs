//! Lexical relevance of bibliographic records and web pages to a claim.

use std::collections::HashSet;

use hallucheck_common::types::BibRecord;

/// Only this prefix of a page's readable text is compared with the claim.
pub const PAGE_WINDOW_CHARS: usize = 1000;

const NEUTRAL_RELEVANCE: f64 = 0.5;
const EMPTY_RECORD_RELEVANCE: f64 = 0.3;
const MIN_CONTENT_WORD_CHARS: usize = 4;

/// Lowercased word tokens (letters, digits, underscore).
pub fn word_set(text: &str) -> HashSet<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Words of at least four characters, lowercased.
pub fn content_words(text: &str) -> HashSet<String> {
    word_set(text)
        .into_iter()
        .filter(|w| w.chars().count() >= MIN_CONTENT_WORD_CHARS)
        .collect()
}

fn coverage(needles: &HashSet<String>, haystack: &HashSet<String>) -> f64 {
    let hits = needles.iter().filter(|w| haystack.contains(*w)).count();
    hits as f64 / needles.len() as f64
}

/// Share of the claim's words found in the record's title and abstract.
pub fn paper_relevance(record: &BibRecord, claim_text: &str) -> f64 {
    let claim_words = word_set(claim_text);
    if claim_words.is_empty() {
        return NEUTRAL_RELEVANCE;
    }
    if record.title.trim().is_empty() && record.abstract_text.trim().is_empty() {
        return EMPTY_RECORD_RELEVANCE;
    }

    let paper_words = word_set(&format!("{} {}", record.title, record.abstract_text));
    coverage(&claim_words, &paper_words)
}

/// Share of the claim's content words found near the top of a page.
pub fn page_relevance(page_text: &str, claim_text: &str) -> f64 {
    let claim_words = content_words(claim_text);
    if claim_words.is_empty() {
        return NEUTRAL_RELEVANCE;
    }

    let window: String = page_text.chars().take(PAGE_WINDOW_CHARS).collect();
    coverage(&claim_words, &word_set(&window))
}

/// Relevance when the page answered 200 but its body could not be read.
pub fn unreadable_page_relevance() -> f64 {
    NEUTRAL_RELEVANCE
}
