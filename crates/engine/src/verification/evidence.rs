use std::sync::Arc;

use futures::future::join_all;

use hallucheck_common::types::Evidence;
use hallucheck_common::{HallucheckError, Result};

use crate::sources::EvidenceSource;

/// Queries every evidence source and unions the results.
pub struct EvidenceRetriever {
    sources: Vec<Arc<dyn EvidenceSource>>,
    max_results: usize,
}

impl EvidenceRetriever {
    pub fn new(sources: Vec<Arc<dyn EvidenceSource>>, max_results: usize) -> Self {
        Self {
            sources,
            max_results,
        }
    }

    /// Results in source order, capped at `max_results`. A failing source is
    /// skipped; an error is returned only when every source fails.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<Evidence>> {
        if query.trim().is_empty() || self.sources.is_empty() {
            return Ok(Vec::new());
        }

        let outcomes = join_all(self.sources.iter().map(|s| s.search(query))).await;

        let mut evidence = Vec::new();
        let mut failures = Vec::new();
        for (source, outcome) in self.sources.iter().zip(outcomes) {
            match outcome {
                Ok(items) => evidence.extend(items),
                Err(e) => {
                    tracing::warn!(source = source.name(), query, error = %e, "Evidence source failed");
                    failures.push(format!("{}: {}", source.name(), e));
                }
            }
        }

        if failures.len() == self.sources.len() {
            return Err(HallucheckError::Evidence(failures.join("; ")));
        }

        evidence.truncate(self.max_results);
        Ok(evidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Canned {
        name: &'static str,
        items: Option<Vec<Evidence>>,
    }

    #[async_trait]
    impl EvidenceSource for Canned {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn search(&self, _query: &str) -> Result<Vec<Evidence>> {
            self.items
                .clone()
                .ok_or_else(|| HallucheckError::Evidence("unavailable".into()))
        }
    }

    fn items(source: &str, n: usize) -> Option<Vec<Evidence>> {
        Some(
            (0..n)
                .map(|i| Evidence {
                    source: source.into(),
                    title: format!("{} {}", source, i),
                    text: "text".into(),
                    url: String::new(),
                })
                .collect(),
        )
    }

    fn canned(name: &'static str, items: Option<Vec<Evidence>>) -> Arc<dyn EvidenceSource> {
        Arc::new(Canned { name, items })
    }

    #[tokio::test]
    async fn test_union_in_source_order_and_capped() {
        let retriever = EvidenceRetriever::new(
            vec![canned("wiki", items("wiki", 3)), canned("s2", items("s2", 3))],
            5,
        );
        let evidence = retriever.retrieve("glaciers").await.unwrap();
        assert_eq!(evidence.len(), 5);
        assert_eq!(evidence[0].source, "wiki");
        assert_eq!(evidence[3].source, "s2");
    }

    #[tokio::test]
    async fn test_partial_failure_is_skipped() {
        let retriever = EvidenceRetriever::new(
            vec![canned("wiki", None), canned("s2", items("s2", 2))],
            5,
        );
        let evidence = retriever.retrieve("glaciers").await.unwrap();
        assert_eq!(evidence.len(), 2);
    }

    #[tokio::test]
    async fn test_total_failure_is_an_error() {
        let retriever =
            EvidenceRetriever::new(vec![canned("wiki", None), canned("s2", None)], 5);
        let err = retriever.retrieve("glaciers").await.unwrap_err();
        assert!(matches!(err, HallucheckError::Evidence(_)));
    }

    #[tokio::test]
    async fn test_empty_query_short_circuits() {
        let retriever = EvidenceRetriever::new(vec![canned("wiki", None)], 5);
        assert!(retriever.retrieve("").await.unwrap().is_empty());
    }
}
