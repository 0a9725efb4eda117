//! Nearest-citation association for claims.
//!
//! Each claim picks its nearest citation independently. A citation may end
//! up paired with several claims; no global assignment is computed.

use hallucheck_common::types::{Citation, Claim};

/// Citations this many characters from the end of a claim, or farther, are
/// never paired with it.
pub const MAX_PAIRING_DISTANCE: usize = 200;

/// A claim and the citation nearest to it, if any is close enough.
#[derive(Clone, Copy, Debug)]
pub struct ClaimCitationPair<'a> {
    pub claim: &'a Claim,
    pub citation: Option<&'a Citation>,
    /// Position of `citation` in the extracted citation list.
    pub citation_index: Option<usize>,
    /// `1 / (1 + distance / 100)`, or 0.0 when unpaired.
    pub proximity_score: f64,
}

impl ClaimCitationPair<'_> {
    pub fn is_paired(&self) -> bool {
        self.citation.is_some()
    }
}

/// Decays smoothly from 1.0 at distance zero.
pub fn proximity_score(distance: usize) -> f64 {
    1.0 / (1.0 + distance as f64 / 100.0)
}

/// One pair per claim, in claim order.
///
/// Distance is `|citation.start - claim.end|`. Ties go to the citation seen
/// first in `citations` order.
pub fn pair_claims<'a>(claims: &'a [Claim], citations: &'a [Citation]) -> Vec<ClaimCitationPair<'a>> {
    claims
        .iter()
        .map(|claim| {
            let nearest = citations
                .iter()
                .enumerate()
                .map(|(index, citation)| (index, citation.span.start.abs_diff(claim.span.end)))
                .filter(|(_, distance)| *distance < MAX_PAIRING_DISTANCE)
                .fold(None, |best: Option<(usize, usize)>, (index, distance)| match best {
                    Some((_, best_distance)) if best_distance <= distance => best,
                    _ => Some((index, distance)),
                });

            match nearest {
                Some((index, distance)) => ClaimCitationPair {
                    claim,
                    citation: Some(&citations[index]),
                    citation_index: Some(index),
                    proximity_score: proximity_score(distance),
                },
                None => ClaimCitationPair {
                    claim,
                    citation: None,
                    citation_index: None,
                    proximity_score: 0.0,
                },
            }
        })
        .collect()
}

/// For each citation, the text of the claim it is paired with, or "" when
/// no claim picked it. When several claims share a citation the last one
/// wins.
pub fn claim_text_by_citation<'a>(
    pairs: &[ClaimCitationPair<'a>],
    citation_count: usize,
) -> Vec<&'a str> {
    let mut texts = vec![""; citation_count];
    for pair in pairs {
        if let Some(index) = pair.citation_index {
            if let Some(slot) = texts.get_mut(index) {
                *slot = pair.claim.text.as_str();
            }
        }
    }
    texts
}
