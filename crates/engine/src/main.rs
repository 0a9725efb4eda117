use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;

use hallucheck_engine::config;
use hallucheck_engine::routes::{self, AppState};
use hallucheck_engine::Analyzer;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Hallucheck starting");

    // Fail loudly on misconfiguration.
    let config_dir = config::config_dir_from_env();
    let engine_config = match config::load_config(&config_dir) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration, refusing to start");
            std::process::exit(1);
        }
    };

    let metrics_handle = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!(error = %e, "Failed to install Prometheus metrics recorder");
            std::process::exit(1);
        }
    };

    let analyzer = match Analyzer::from_config(&engine_config.system) {
        Ok(analyzer) => analyzer,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build analyzer");
            std::process::exit(1);
        }
    };

    let state = Arc::new(AppState {
        analyzer: Arc::new(analyzer),
        metrics_handle: Some(metrics_handle),
        max_input_chars: engine_config.system.verification.max_input_chars as usize,
    });
    let app = routes::router(state);

    let port: u16 = std::env::var("HALLUCHECK_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, port, "Failed to bind TCP listener");
            std::process::exit(1);
        }
    };

    tracing::info!(port, "Hallucheck listening");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "HTTP server error");
        std::process::exit(1);
    }
}
