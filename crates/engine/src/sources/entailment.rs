use async_trait::async_trait;
use serde::Serialize;

use hallucheck_common::{HallucheckError, Result};

use super::{ensure_success, read_json, Entailment, EntailmentScores, HttpContext};

const SOURCE: &str = "entailment";
/// Classifier inputs are cut to this many characters.
const MAX_INPUT_CHARS: usize = 256;

/// Entailment classifier served over HTTP.
///
/// POSTs `{"claim", "evidence"}` and expects
/// `{"entailment", "neutral", "contradiction"}` probabilities back.
pub struct HttpEntailment {
    ctx: HttpContext,
    url: String,
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    claim: &'a str,
    evidence: &'a str,
}

impl HttpEntailment {
    pub fn new(ctx: HttpContext, url: impl Into<String>) -> Self {
        Self {
            ctx,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Entailment for HttpEntailment {
    async fn classify(&self, claim: &str, evidence: &str) -> Result<EntailmentScores> {
        let body = ClassifyRequest {
            claim: truncate_chars(claim, MAX_INPUT_CHARS),
            evidence: truncate_chars(evidence, MAX_INPUT_CHARS),
        };
        let request = self.ctx.http.post(&self.url).json(&body);
        let response = self
            .ctx
            .send(SOURCE, SOURCE, request, HallucheckError::Entailment)
            .await?;
        let response = ensure_success(response, SOURCE, HallucheckError::Entailment).await?;
        let scores: EntailmentScores = read_json(response, SOURCE, HallucheckError::Entailment).await?;

        let all = [scores.entailment, scores.neutral, scores.contradiction];
        if all.iter().any(|p| !p.is_finite() || !(0.0..=1.0).contains(p)) {
            return Err(HallucheckError::Entailment(format!(
                "probabilities out of range: {:?}",
                scores
            )));
        }
        Ok(scores)
    }
}

/// Stand-in when no classifier is configured. Everything is neutral, so no
/// contradiction is ever reported.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeutralEntailment;

#[async_trait]
impl Entailment for NeutralEntailment {
    async fn classify(&self, _claim: &str, _evidence: &str) -> Result<EntailmentScores> {
        Ok(EntailmentScores {
            entailment: 0.0,
            neutral: 1.0,
            contradiction: 0.0,
        })
    }
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::testing;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars(&"é".repeat(300), 256).chars().count(), 256);
    }

    #[tokio::test]
    async fn test_http_classifier() {
        let router = Router::new().route(
            "/classify",
            post(|Json(body): Json<Value>| async move {
                assert!(body["evidence"].as_str().unwrap().chars().count() <= 256);
                let contradiction = if body["claim"] == "The moon is cheese" { 0.9 } else { 0.1 };
                Json(json!({
                    "entailment": 0.9 - contradiction,
                    "neutral": 0.1,
                    "contradiction": contradiction
                }))
            }),
        );
        let base = testing::serve(router).await;
        let nli = HttpEntailment::new(testing::context(), format!("{}/classify", base));

        let scores = nli
            .classify("The moon is cheese", &"rock ".repeat(200))
            .await
            .unwrap();
        assert!(scores.contradiction > 0.5);
    }

    #[tokio::test]
    async fn test_out_of_range_probabilities_rejected() {
        let router = Router::new().route(
            "/classify",
            post(|| async {
                Json(json!({"entailment": 1.5, "neutral": 0.0, "contradiction": -0.5}))
            }),
        );
        let base = testing::serve(router).await;
        let nli = HttpEntailment::new(testing::context(), format!("{}/classify", base));

        let err = nli.classify("a", "b").await.unwrap_err();
        assert!(matches!(err, HallucheckError::Entailment(_)));
    }

    #[tokio::test]
    async fn test_neutral_never_contradicts() {
        let scores = NeutralEntailment.classify("x", "y").await.unwrap();
        assert_eq!(scores.contradiction, 0.0);
        assert_eq!(scores.neutral, 1.0);
    }
}
