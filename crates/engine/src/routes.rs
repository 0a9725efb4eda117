//! HTTP boundary.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;

use hallucheck_common::api::verify::{ErrorResponse, ServiceInfo, VerifyRequest};
use hallucheck_common::{HallucheckError, Result};

use crate::pipeline::Analyzer;

/// Shared application state accessible from axum handlers.
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
    /// Absent when no recorder is installed (tests).
    pub metrics_handle: Option<PrometheusHandle>,
    pub max_input_chars: usize,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/verify", post(verify_handler))
        .with_state(state)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

async fn root_handler() -> Json<ServiceInfo> {
    let endpoints = BTreeMap::from([
        ("GET /health".to_string(), "Liveness check".to_string()),
        ("GET /metrics".to_string(), "Prometheus metrics".to_string()),
        (
            "POST /verify".to_string(),
            "Analyze text for hallucinated claims and citations".to_string(),
        ),
    ]);

    Json(ServiceInfo {
        name: "hallucheck".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        endpoints,
    })
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// Prometheus metrics endpoint.
async fn metrics_handler(State(state): State<Arc<AppState>>) -> String {
    state
        .metrics_handle
        .as_ref()
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}

/// Reject requests the analyzer should never see.
fn validate_request(request: &VerifyRequest, max_input_chars: usize) -> Result<()> {
    if request.text.trim().is_empty() {
        return Err(HallucheckError::Validation("Text must not be empty".into()));
    }
    let chars = request.text.chars().count();
    if chars > max_input_chars {
        tracing::warn!(chars, max = max_input_chars, "Rejected oversized text");
        return Err(HallucheckError::Validation(format!(
            "Text exceeds {} characters",
            max_input_chars
        )));
    }
    Ok(())
}

fn failure_response(error: HallucheckError) -> Response {
    if error.is_client_error() {
        error_response(StatusCode::BAD_REQUEST, error.to_string())
    } else {
        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Verification failed: {}", error),
        )
    }
}

async fn verify_handler(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<VerifyRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    if let Err(e) = validate_request(&request, state.max_input_chars) {
        return failure_response(e);
    }

    match state
        .analyzer
        .analyze_and_score(&request.text, request.verify_citations, request.verify_facts)
        .await
    {
        Ok(report) => Json(report).into_response(),
        Err(e) => failure_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hallucheck_common::config::SystemConfig;
    use hallucheck_common::types::HallucinationReport;
    use serde_json::{json, Value};

    async fn serve(max_input_chars: usize) -> String {
        let analyzer = Analyzer::from_config(&SystemConfig::default()).unwrap();
        let state = Arc::new(AppState {
            analyzer: Arc::new(analyzer),
            metrics_handle: None,
            max_input_chars,
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_root_and_health() {
        let base = serve(100).await;
        let info: Value = reqwest::get(format!("{}/", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(info["name"], "hallucheck");
        assert!(info["endpoints"]["POST /verify"].is_string());

        let health = reqwest::get(format!("{}/health", base)).await.unwrap();
        assert_eq!(health.status(), 200);
    }

    #[tokio::test]
    async fn test_verify_with_checks_disabled() {
        let base = serve(1000).await;
        let response = reqwest::Client::new()
            .post(format!("{}/verify", base))
            .json(&json!({
                "text": "Smith et al. (2021) showed 73% improvement [1].",
                "verify_citations": false,
                "verify_facts": false
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let report: HallucinationReport = response.json().await.unwrap();
        assert_eq!(report.total_claims, 1);
        assert_eq!(report.total_citations, 2);
        assert_eq!(report.risk_score, 0.0);
        assert!(report.issues.is_empty());
    }

    #[tokio::test]
    async fn test_rejects_empty_and_oversized_text() {
        let base = serve(10).await;
        let client = reqwest::Client::new();

        for text in ["   ", "this text is far too long"] {
            let response = client
                .post(format!("{}/verify", base))
                .json(&json!({ "text": text }))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), 400);
            let body: Value = response.json().await.unwrap();
            assert!(body["error"].as_str().unwrap().starts_with("Validation error"));
        }
    }

    fn request(text: &str) -> VerifyRequest {
        VerifyRequest {
            text: text.into(),
            verify_citations: true,
            verify_facts: true,
        }
    }

    #[test]
    fn test_validate_request() {
        assert!(validate_request(&request("Water boils at 100 C."), 50).is_ok());
        assert!(validate_request(&request("ééééé"), 5).is_ok());

        let err = validate_request(&request(" \n "), 50).unwrap_err();
        assert!(matches!(err, HallucheckError::Validation(_)));
        let err = validate_request(&request("ééééé!"), 5).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Text exceeds 5 characters");
    }

    #[test]
    fn test_failure_status_mapping() {
        let response = failure_response(HallucheckError::Validation("bad".into()));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let response = failure_response(HallucheckError::Internal("boom".into()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let base = serve(10).await;
        let response = reqwest::Client::new()
            .post(format!("{}/verify", base))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
    }

    #[tokio::test]
    async fn test_metrics_without_recorder_is_empty() {
        let base = serve(10).await;
        let body = reqwest::get(format!("{}/metrics", base))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(body.is_empty());
    }
}
