use regex::Regex;

use crate::extraction::HEDGE_PHRASES;

const MAX_QUERY_TOKENS: usize = 10;
const MIN_KEYWORD_CHARS: usize = 4;

/// Reduces a claim to a keyword query for evidence search.
pub struct SearchQueryBuilder {
    hedges: Regex,
}

impl SearchQueryBuilder {
    pub fn new() -> Self {
        let alternatives: Vec<String> = HEDGE_PHRASES.iter().map(|p| regex::escape(p)).collect();
        let hedges = Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|")))
            .expect("hedge phrases form a valid pattern");
        Self { hedges }
    }

    /// Hedge phrases removed; tokens longer than three characters or
    /// starting with a digit kept, at most ten.
    pub fn build(&self, claim_text: &str) -> String {
        let stripped = self.hedges.replace_all(claim_text, " ");
        stripped
            .split_whitespace()
            .filter(|token| {
                token.chars().count() >= MIN_KEYWORD_CHARS
                    || token.starts_with(|c: char| c.is_ascii_digit())
            })
            .take(MAX_QUERY_TOKENS)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for SearchQueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_hedges_and_short_words() {
        let q = SearchQueryBuilder::new();
        assert_eq!(
            q.build("According to NASA, the sea rose 3 inches in 2020."),
            "NASA, rose 3 inches 2020."
        );
    }

    #[test]
    fn test_hedges_are_case_insensitive() {
        let q = SearchQueryBuilder::new();
        assert_eq!(
            q.build("RESEARCH SHOWS coffee improves memory"),
            "coffee improves memory"
        );
        assert_eq!(q.build("Studies indicate that Data suggests things"), "that things");
    }

    #[test]
    fn test_caps_at_ten_tokens() {
        let q = SearchQueryBuilder::new();
        let claim = (1..=15).map(|i| format!("word{}", i)).collect::<Vec<_>>().join(" ");
        let query = q.build(&claim);
        assert_eq!(query.split(' ').count(), 10);
        assert!(query.ends_with("word10"));
    }

    #[test]
    fn test_empty_claim_gives_empty_query() {
        let q = SearchQueryBuilder::new();
        assert_eq!(q.build(""), "");
        assert_eq!(q.build("a an the of"), "");
    }
}
