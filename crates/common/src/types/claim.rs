use serde::{Deserialize, Serialize};

use super::Span;

/// Confidence assigned when a sentence passes both the indicator and the
/// entity check.
pub const STRONG_CLAIM_CONFIDENCE: f64 = 0.7;
/// Confidence assigned when only one of the two checks passes.
pub const WEAK_CLAIM_CONFIDENCE: f64 = 0.5;

/// An atomic factual assertion: one sentence that looks factual.
///
/// Created once per qualifying sentence and never mutated afterwards.
/// Confidence is an informational hint, not a gate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// The source sentence, trimmed.
    pub text: String,
    pub span: Span,
    pub confidence: f64,
}

impl Claim {
    pub fn new(text: String, span: Span, has_indicator: bool, has_entity: bool) -> Self {
        let confidence = if has_indicator && has_entity {
            STRONG_CLAIM_CONFIDENCE
        } else {
            WEAK_CLAIM_CONFIDENCE
        };
        Self {
            text,
            span,
            confidence,
        }
    }
}
