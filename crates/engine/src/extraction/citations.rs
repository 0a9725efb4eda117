use regex::Regex;

use hallucheck_common::types::{AuthorYear, CharOffsets, Citation, CitationKind};

/// Trailing characters that end a sentence rather than a URL or DOI.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '\'', '"'];

/// Pattern-based citation extraction.
///
/// Each family scans the whole text on its own. Overlapping matches from
/// different families are all kept, in family order: APA, MLA, IEEE, URL,
/// DOI. Within a family, matches appear in text order.
pub struct CitationExtractor {
    apa: Regex,
    mla: Regex,
    ieee: Regex,
    url: Regex,
    doi: Regex,
    surname: Regex,
}

impl Default for CitationExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl CitationExtractor {
    pub fn new() -> Self {
        let compile = |pattern: &str| Regex::new(pattern).expect("citation pattern is valid");
        Self {
            apa: compile(
                r"([A-Z][a-z]+(?:\s+et\s+al\.)?(?:\s+and\s+[A-Z][a-z]+)?)\s*\((\d{4})\)",
            ),
            mla: compile(r"([A-Z][a-z]+(?:\s+et\s+al\.)?)\s+(\d{4})"),
            ieee: compile(r"\[(\d+)\]"),
            url: compile(r"https?://[^\s)]+"),
            doi: compile(r"(?i:doi):([^\s)]+)"),
            surname: compile(r"[A-Z][a-z]+"),
        }
    }

    pub fn extract(&self, text: &str) -> Vec<Citation> {
        let offsets = CharOffsets::new(text);
        let mut citations = Vec::new();

        for caps in self.apa.captures_iter(text) {
            let (Some(whole), Some(names), Some(year)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            citations.push(Citation::new(
                whole.as_str(),
                CitationKind::Apa(self.author_year(names.as_str(), year.as_str())),
                offsets.span(whole.start(), whole.end()),
            ));
        }

        for caps in self.mla.captures_iter(text) {
            let (Some(whole), Some(names), Some(year)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            citations.push(Citation::new(
                whole.as_str(),
                CitationKind::Mla(self.author_year(names.as_str(), year.as_str())),
                offsets.span(whole.start(), whole.end()),
            ));
        }

        for caps in self.ieee.captures_iter(text) {
            let (Some(whole), Some(number)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            citations.push(Citation::new(
                whole.as_str(),
                CitationKind::Ieee {
                    reference_number: number.as_str().to_string(),
                },
                offsets.span(whole.start(), whole.end()),
            ));
        }

        for found in self.url.find_iter(text) {
            let url = found.as_str().trim_end_matches(TRAILING_PUNCTUATION);
            if url.is_empty() {
                continue;
            }
            citations.push(Citation::new(
                url,
                CitationKind::Url {
                    url: url.to_string(),
                },
                offsets.span(found.start(), found.start() + url.len()),
            ));
        }

        for caps in self.doi.captures_iter(text) {
            let (Some(whole), Some(id)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let doi = id.as_str().trim_end_matches(TRAILING_PUNCTUATION);
            if doi.is_empty() {
                continue;
            }
            let end = id.start() + doi.len();
            citations.push(Citation::new(
                &text[whole.start()..end],
                CitationKind::Doi {
                    doi: doi.to_string(),
                },
                offsets.span(whole.start(), end),
            ));
        }

        citations
    }

    fn author_year(&self, names: &str, year: &str) -> AuthorYear {
        AuthorYear {
            authors: self
                .surname
                .find_iter(names)
                .map(|m| m.as_str().to_string())
                .collect(),
            et_al: names.contains("et al"),
            year: year.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hallucheck_common::types::{CitationType, Span};

    fn types(citations: &[Citation]) -> Vec<CitationType> {
        citations.iter().map(|c| c.citation_type()).collect()
    }

    #[test]
    fn test_apa_and_ieee_in_one_sentence() {
        let text = "Smith et al. (2021) showed 73% improvement [1].";
        let citations = CitationExtractor::new().extract(text);

        assert_eq!(types(&citations), vec![CitationType::Apa, CitationType::Ieee]);

        let apa = &citations[0];
        assert_eq!(apa.text, "Smith et al. (2021)");
        assert_eq!(apa.span, Span::new(0, 19));
        let ay = apa.author_year().unwrap();
        assert_eq!(ay.authors, vec!["Smith"]);
        assert!(ay.et_al);
        assert_eq!(ay.year, "2021");

        let ieee = &citations[1];
        assert_eq!(ieee.reference_number(), Some("1"));
        assert_eq!(ieee.span.slice(text), Some("[1]"));
    }

    #[test]
    fn test_two_author_apa() {
        let citations = CitationExtractor::new().extract("As Lee and Park (2019) argue.");
        assert_eq!(citations.len(), 1);
        let ay = citations[0].author_year().unwrap();
        assert_eq!(ay.authors, vec!["Lee", "Park"]);
        assert!(!ay.et_al);
    }

    #[test]
    fn test_mla_style() {
        let citations = CitationExtractor::new().extract("This was shown (Johnson 2022).");
        assert_eq!(types(&citations), vec![CitationType::Mla]);
        assert_eq!(citations[0].text, "Johnson 2022");
        assert_eq!(citations[0].author_year().unwrap().year, "2022");
    }

    #[test]
    fn test_url_trailing_punctuation_and_paren() {
        let text = "See https://example.com/research. Also (https://foo.org/a?b=1).";
        let citations = CitationExtractor::new().extract(text);
        let urls: Vec<&str> = citations.iter().filter_map(|c| c.url()).collect();
        assert_eq!(urls, vec!["https://example.com/research", "https://foo.org/a?b=1"]);
        for c in &citations {
            assert_eq!(c.span.slice(text), Some(c.text.as_str()));
        }
    }

    #[test]
    fn test_spans_are_character_offsets() {
        let text = "Über Zürich — see doi:10.1/ü [2].";
        let citations = CitationExtractor::new().extract(text);
        assert_eq!(types(&citations), vec![CitationType::Ieee, CitationType::Doi]);
        assert_eq!(citations[0].span, Span::new(29, 32));
        assert_eq!(citations[1].span, Span::new(18, 28));
        for c in &citations {
            assert_eq!(c.span.slice(text), Some(c.text.as_str()));
        }
    }

    #[test]
    fn test_doi_prefix_is_case_insensitive() {
        let text = "Published as DOI:10.1038/nature14539, and doi:10.1126/science.1.";
        let citations = CitationExtractor::new().extract(text);
        let dois: Vec<&str> = citations.iter().filter_map(|c| c.doi()).collect();
        assert_eq!(dois, vec!["10.1038/nature14539", "10.1126/science.1"]);
        assert_eq!(citations[0].text, "DOI:10.1038/nature14539");
    }

    #[test]
    fn test_overlapping_families_are_all_kept() {
        // The URL itself contains a DOI marker; both families report it.
        let text = "Data at https://x.org/doi:10.5/abc here.";
        let citations = CitationExtractor::new().extract(text);
        assert_eq!(types(&citations), vec![CitationType::Url, CitationType::Doi]);
        assert!(citations[1].span.start > citations[0].span.start);
        assert!(citations[1].span.end == citations[0].span.end);
    }

    #[test]
    fn test_lowercase_names_are_not_citations() {
        assert!(CitationExtractor::new()
            .extract("the results in smith (2020) were poor")
            .is_empty());
    }

    #[test]
    fn test_plain_text_has_no_citations() {
        assert!(CitationExtractor::new().extract("").is_empty());
        assert!(CitationExtractor::new().extract("nothing to see").is_empty());
    }
}
