use std::fmt;

use serde::{Deserialize, Serialize};

use super::Span;

/// Citation style tag. Closed set: numbered styles beyond IEEE or other
/// reference formats are not recognized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CitationType {
    Apa,
    Mla,
    Ieee,
    Url,
    Doi,
}

impl CitationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Apa => "apa",
            Self::Mla => "mla",
            Self::Ieee => "ieee",
            Self::Url => "url",
            Self::Doi => "doi",
        }
    }
}

impl fmt::Display for CitationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Author surnames and year of an author-year citation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorYear {
    /// Surnames in citation order, without "et al." or "and".
    pub authors: Vec<String>,
    /// Whether the citation abbreviated further authors with "et al.".
    #[serde(default)]
    pub et_al: bool,
    pub year: String,
}

/// Type-specific payload of a citation. Each variant carries only the fields
/// that make sense for its style.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "citation_type", rename_all = "lowercase")]
pub enum CitationKind {
    Apa(AuthorYear),
    Mla(AuthorYear),
    Ieee { reference_number: String },
    Url { url: String },
    Doi { doi: String },
}

/// A reference marker found in text.
///
/// One text span may produce several citations from different pattern
/// families. They are kept and verified independently.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Raw matched text.
    pub text: String,
    pub kind: CitationKind,
    pub span: Span,
}

impl Citation {
    pub fn new(text: impl Into<String>, kind: CitationKind, span: Span) -> Self {
        Self {
            text: text.into(),
            kind,
            span,
        }
    }

    pub fn citation_type(&self) -> CitationType {
        match self.kind {
            CitationKind::Apa(_) => CitationType::Apa,
            CitationKind::Mla(_) => CitationType::Mla,
            CitationKind::Ieee { .. } => CitationType::Ieee,
            CitationKind::Url { .. } => CitationType::Url,
            CitationKind::Doi { .. } => CitationType::Doi,
        }
    }

    pub fn author_year(&self) -> Option<&AuthorYear> {
        match &self.kind {
            CitationKind::Apa(ay) | CitationKind::Mla(ay) => Some(ay),
            _ => None,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match &self.kind {
            CitationKind::Url { url } => Some(url),
            _ => None,
        }
    }

    pub fn doi(&self) -> Option<&str> {
        match &self.kind {
            CitationKind::Doi { doi } => Some(doi),
            _ => None,
        }
    }

    pub fn reference_number(&self) -> Option<&str> {
        match &self.kind {
            CitationKind::Ieee { reference_number } => Some(reference_number),
            _ => None,
        }
    }
}
