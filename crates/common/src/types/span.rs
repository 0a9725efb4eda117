use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Half-open character range `[start, end)` into the analyzed text.
///
/// Offsets count Unicode scalar values, not bytes, so distances between
/// spans do not depend on how the text is encoded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start must not exceed end");
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether this span lies inside a text of `char_len` characters.
    pub fn fits(&self, char_len: usize) -> bool {
        self.start <= self.end && self.end <= char_len
    }

    /// The covered substring of `text`, if the span lies inside it.
    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        CharOffsets::new(text)
            .byte_range(*self)
            .and_then(|range| text.get(range))
    }
}

/// Byte offset of every character of one text, for converting between the
/// byte positions regex and `str` searches report and character spans.
#[derive(Clone, Debug)]
pub struct CharOffsets {
    /// Byte offset of each char, followed by the text's byte length.
    bytes: Vec<usize>,
}

impl CharOffsets {
    pub fn new(text: &str) -> Self {
        let mut bytes: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        bytes.push(text.len());
        Self { bytes }
    }

    /// Number of characters in the text.
    pub fn char_len(&self) -> usize {
        self.bytes.len() - 1
    }

    /// Character index of a byte offset. Offsets inside a multi-byte char
    /// round down to that char.
    pub fn char_index(&self, byte: usize) -> usize {
        match self.bytes.binary_search(&byte) {
            Ok(index) => index,
            Err(index) => index.saturating_sub(1),
        }
    }

    /// Character span of the byte range `start..end`.
    pub fn span(&self, start: usize, end: usize) -> Span {
        Span::new(self.char_index(start), self.char_index(end))
    }

    /// Byte range covered by `span`, or `None` when it lies outside the text.
    pub fn byte_range(&self, span: Span) -> Option<Range<usize>> {
        if span.start > span.end {
            return None;
        }
        Some(*self.bytes.get(span.start)?..*self.bytes.get(span.end)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits_counts_characters() {
        let text = "café au lait";
        let len = text.chars().count();
        assert_eq!(len, 12);
        assert!(Span::new(0, 12).fits(len));
        assert!(!Span::new(3, 13).fits(len));
        assert!(Span::new(12, 12).fits(len));
    }

    #[test]
    fn test_byte_and_char_offsets_convert_both_ways() {
        let text = "Ère née [1]";
        let offsets = CharOffsets::new(text);
        assert_eq!(offsets.char_len(), 11);

        let byte_start = text.find("[1]").unwrap();
        assert_eq!(byte_start, 10);
        let span = offsets.span(byte_start, byte_start + 3);
        assert_eq!(span, Span::new(8, 11));
        assert_eq!(offsets.byte_range(span), Some(10..13));
        assert_eq!(span.slice(text), Some("[1]"));
    }

    #[test]
    fn test_out_of_range_span_has_no_slice() {
        assert_eq!(Span::new(3, 40).slice("short"), None);
        assert_eq!(Span::new(0, 5).slice("short"), Some("short"));
    }

    #[test]
    fn test_mid_char_byte_rounds_down() {
        let offsets = CharOffsets::new("é!");
        assert_eq!(offsets.char_index(1), 0);
        assert_eq!(offsets.char_index(2), 1);
    }
}
