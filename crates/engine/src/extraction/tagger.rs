use hallucheck_common::types::{CharOffsets, Span};
use unicode_segmentation::UnicodeSegmentation;

/// One sentence as reported by a tagger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaggedSentence {
    /// Trimmed sentence span in the tagged text, in characters.
    pub span: Span,
    /// Whether the sentence mentions at least one named entity.
    pub has_entity: bool,
}

/// Sentence boundary detection plus a per-sentence entity signal.
///
/// Extraction only needs these two facts about each sentence; richer
/// taggers (POS models, NER services) plug in behind this trait.
pub trait SentenceTagger: Send + Sync {
    fn tag(&self, text: &str) -> Vec<TaggedSentence>;
}

/// UAX-29 sentence boundaries with a capitalization heuristic for entities.
///
/// A sentence has an entity when a token after the first starts with an
/// uppercase letter, or when the first token is an acronym.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicTagger;

impl SentenceTagger for HeuristicTagger {
    fn tag(&self, text: &str) -> Vec<TaggedSentence> {
        let offsets = CharOffsets::new(text);
        text.split_sentence_bound_indices()
            .filter_map(|(offset, raw)| {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return None;
                }
                let start = offset + (raw.len() - raw.trim_start().len());
                Some(TaggedSentence {
                    span: offsets.span(start, start + trimmed.len()),
                    has_entity: has_entity(trimmed),
                })
            })
            .collect()
    }
}

fn has_entity(sentence: &str) -> bool {
    let mut tokens = sentence
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| !t.is_empty());

    match tokens.next() {
        Some(first) if is_acronym(first) => return true,
        None => return false,
        _ => {}
    }

    tokens.any(|t| is_acronym(t) || is_capitalized_word(t))
}

fn is_capitalized_word(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(c) if c.is_uppercase() => {
            let rest = chars.as_str();
            !rest.is_empty() && rest.chars().all(|c| c.is_alphabetic() || c == '-' || c == '\'')
        }
        _ => false,
    }
}

fn is_acronym(token: &str) -> bool {
    token.chars().count() >= 2 && token.chars().all(|c| c.is_uppercase())
}
