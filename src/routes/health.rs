use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::app_state::AppState;

#[derive(Serialize)]
pub struct LivenessResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub image_mode: String,
    pub model: String,
    pub scenes: usize,
}

/// GET / and GET /test: liveness probe.
pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        message: "Backend is running".to_string(),
    })
}

/// GET /health: process status and active generation settings.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let settings = state.orchestrator.settings();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        image_mode: settings.image_mode.to_string(),
        model: settings.model_version.clone(),
        scenes: state.prompts.scene_names().count(),
    })
}
