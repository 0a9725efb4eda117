//! Claim and citation extraction from raw text.
//!
//! Extraction never fails: malformed or empty input yields empty lists.

mod citations;
mod claims;
mod tagger;

pub use citations::CitationExtractor;
pub use claims::{ClaimExtractor, HEDGE_PHRASES};
pub use tagger::{HeuristicTagger, SentenceTagger, TaggedSentence};

use hallucheck_common::types::{Citation, Claim};

/// Claims and citations found in one text.
#[derive(Clone, Debug, Default)]
pub struct Extraction {
    pub claims: Vec<Claim>,
    pub citations: Vec<Citation>,
}

/// Runs both extractors over the same text.
pub struct TextExtractor {
    claims: ClaimExtractor,
    citations: CitationExtractor,
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor {
    pub fn new() -> Self {
        Self {
            claims: ClaimExtractor::new(),
            citations: CitationExtractor::new(),
        }
    }

    pub fn extract(&self, text: &str, tagger: &dyn SentenceTagger) -> Extraction {
        let extraction = Extraction {
            claims: self.claims.extract(text, tagger),
            citations: self.citations.extract(text),
        };

        tracing::debug!(
            claims = extraction.claims.len(),
            citations = extraction.citations.len(),
            "Extraction complete"
        );

        extraction
    }
}
