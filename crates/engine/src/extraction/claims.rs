use regex::RegexSet;

use hallucheck_common::types::{CharOffsets, Claim, Span};

use super::tagger::SentenceTagger;

/// Phrases that introduce a reported finding.
pub const HEDGE_PHRASES: [&str; 5] = [
    "according to",
    "research shows",
    "studies indicate",
    "data suggests",
    "evidence shows",
];

/// Detects sentences that look like factual assertions.
pub struct ClaimExtractor {
    indicators: RegexSet,
}

impl Default for ClaimExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimExtractor {
    pub fn new() -> Self {
        let mut patterns = vec![
            r"\d+%".to_string(),
            r"\d+\.\d+".to_string(),
            r"\d{4}".to_string(),
        ];
        patterns.extend(
            HEDGE_PHRASES
                .iter()
                .map(|phrase| format!("(?i){}", regex::escape(phrase))),
        );

        Self {
            indicators: RegexSet::new(&patterns).expect("factual indicator patterns are valid"),
        }
    }

    /// Whether the sentence contains a number-like or hedge-phrase indicator.
    pub fn has_indicator(&self, sentence: &str) -> bool {
        self.indicators.is_match(sentence)
    }

    /// One claim per sentence with an indicator or an entity.
    pub fn extract(&self, text: &str, tagger: &dyn SentenceTagger) -> Vec<Claim> {
        let offsets = CharOffsets::new(text);
        tagger
            .tag(text)
            .into_iter()
            .filter_map(|tagged| {
                let range = offsets.byte_range(tagged.span)?;
                let sentence = text.get(range)?.trim();
                if sentence.is_empty() {
                    return None;
                }

                let has_indicator = self.has_indicator(sentence);
                if !has_indicator && !tagged.has_entity {
                    return None;
                }

                let span = resolve_span(text, &offsets, sentence, tagged.span);
                Some(Claim::new(
                    sentence.to_string(),
                    span,
                    has_indicator,
                    tagged.has_entity,
                ))
            })
            .collect()
    }
}

/// First case-sensitive occurrence of the sentence in the text, so a
/// repeated sentence always resolves to its first occurrence. Falls back to
/// the tagger's span if the sentence is somehow absent.
fn resolve_span(text: &str, offsets: &CharOffsets, sentence: &str, tagged: Span) -> Span {
    match text.find(sentence) {
        Some(start) => offsets.span(start, start + sentence.len()),
        None => tagged,
    }
}
