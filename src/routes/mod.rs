use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

pub mod generate;
pub mod health;
pub mod metrics;

/// Build the HTTP API. `/metrics` is only mounted when a Prometheus handle is given.
///
/// Uploads over `max_upload_bytes` surface through the multipart extractor
/// and are answered with the JSON error envelope.
pub fn router(
    state: AppState,
    max_upload_bytes: usize,
    prometheus: Option<Arc<PrometheusHandle>>,
) -> Router {
    let mut app = Router::new()
        .route("/", get(health::liveness))
        .route("/test", get(health::liveness))
        .route("/health", get(health::health_check))
        .route("/generate-image", post(generate::generate_image))
        .route("/upload", post(generate::generate_image))
        .with_state(state);

    if let Some(handle) = prometheus {
        app = app.route(
            "/metrics",
            get(metrics::prometheus_metrics).with_state(handle),
        );
    }

    app.layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}
