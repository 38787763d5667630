use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use image_restyle::app_state::AppState;
use image_restyle::config::AppConfig;
use image_restyle::routes;
use image_restyle::services::{
    clock::TokioSleeper, orchestrator::Orchestrator, replicate::ReplicateClient,
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing image-restyle server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    metrics::describe_counter!(
        "generation_requests_total",
        "Total generation requests that reached the orchestrator"
    );
    metrics::describe_counter!(
        "generation_jobs_completed",
        "Total generations that returned an image URL"
    );
    metrics::describe_counter!(
        "generation_jobs_failed",
        "Total generations that failed, by error kind"
    );
    metrics::describe_histogram!(
        "generation_duration_seconds",
        "Time from upload to terminal prediction state"
    );
    metrics::describe_histogram!(
        "generation_poll_attempts",
        "Status requests issued per prediction"
    );

    let prompts = config
        .prompt_catalog()
        .expect("Failed to load prompt catalog");
    tracing::info!(
        scenes = prompts.scene_names().count(),
        "Prompt catalog loaded"
    );

    let upload_dir = config.upload_dir();
    std::fs::create_dir_all(&upload_dir).expect("Failed to create upload directory");

    let settings = config.generation_settings();
    tracing::info!(
        image_mode = %settings.image_mode,
        model = %settings.model_version,
        request_timeout_ms = settings.request_timeout.as_millis() as u64,
        poll_interval_ms = settings.poll_interval.as_millis() as u64,
        poll_max_attempts = settings.poll_max_attempts,
        worst_case_secs = settings.worst_case_duration().as_secs(),
        "Generation settings loaded; upstream proxies must allow requests this long"
    );

    let replicate = ReplicateClient::new(&config.replicate_api_base, &config.replicate_api_key);
    let orchestrator = Orchestrator::new(Arc::new(replicate), Arc::new(TokioSleeper), settings);

    let state = AppState::new(orchestrator, prompts, upload_dir);
    let app = routes::router(state, config.max_upload_bytes, Some(prometheus_handle));

    tracing::info!("Starting image-restyle on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
