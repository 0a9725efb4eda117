//! Per-item verification: citations against bibliographic sources and the
//! web, claims against retrieved evidence.

mod citation;
mod evidence;
mod fact;
mod query;
pub mod relevance;

pub use citation::CitationVerifier;
pub use evidence::EvidenceRetriever;
pub use fact::FactVerifier;
pub use query::SearchQueryBuilder;
