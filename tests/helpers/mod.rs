//! Test helpers: an in-process mock of the Replicate API and request builders
#![allow(dead_code)]

use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

use image_restyle::app_state::AppState;
use image_restyle::config::prompts::PromptCatalog;
use image_restyle::config::{GenerationSettings, ImageMode};
use image_restyle::routes;
use image_restyle::services::clock::TokioSleeper;
use image_restyle::services::orchestrator::Orchestrator;
use image_restyle::services::replicate::ReplicateClient;

pub const TEST_API_KEY: &str = "r8_test_key";
pub const UPLOADED_URL: &str = "https://api.replicate.com/v1/files/abc123/content";
pub const PREDICTION_ID: &str = "pred-xyz";
const BOUNDARY: &str = "----image-restyle-test-boundary";

/// A request the mock received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub authorization: Option<String>,
    pub json: Option<Value>,
    pub upload: Option<RecordedUpload>,
}

#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Scripted responses for the mock Replicate API.
pub struct MockState {
    pub upload_response: Mutex<(u16, Value)>,
    pub create_response: Mutex<(u16, Value)>,
    /// Served in order by GET /predictions/{id}; once empty the job stays `processing`.
    pub statuses: Mutex<VecDeque<(u16, Value)>>,
    /// When set, GET /predictions/{id} never answers.
    pub hang_status: AtomicBool,
    pub requests: Mutex<Vec<RecordedRequest>>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            upload_response: Mutex::new((200, json!({ "urls": { "get": UPLOADED_URL } }))),
            create_response: Mutex::new((201, json!({ "id": PREDICTION_ID, "status": "starting" }))),
            statuses: Mutex::new(VecDeque::new()),
            hang_status: AtomicBool::new(false),
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl MockState {
    pub fn push_status(&self, code: u16, body: Value) {
        self.statuses.lock().unwrap().push_back((code, body));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str, path_prefix: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path.starts_with(path_prefix))
            .count()
    }

    fn record(&self, request: RecordedRequest) {
        self.requests.lock().unwrap().push(request);
    }
}

/// Mock Replicate server bound to an ephemeral local port.
pub struct MockReplicate {
    pub base_url: String,
    pub state: Arc<MockState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockReplicate {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());

        let app = Router::new()
            .route("/v1/files", post(upload_handler))
            .route("/v1/predictions", post(create_handler))
            .route("/v1/predictions/{id}", get(status_handler))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock Replicate");
        let addr = listener.local_addr().expect("No local address");

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            if let Err(e) = server.await {
                eprintln!("Mock Replicate error: {}", e);
            }
        });

        Self {
            base_url: format!("http://{}/v1", addr),
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn client(&self) -> ReplicateClient {
        ReplicateClient::new(&self.base_url, TEST_API_KEY)
    }
}

impl Drop for MockReplicate {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

fn authorization(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

fn reply((code, body): (u16, Value)) -> (StatusCode, Json<Value>) {
    (
        StatusCode::from_u16(code).expect("valid status code"),
        Json(body),
    )
}

async fn upload_handler(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    let mut upload = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        let field_name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        upload = Some(RecordedUpload {
            field: field_name,
            file_name,
            content_type,
            bytes,
        });
    }

    state.record(RecordedRequest {
        method: "POST",
        path: "/files".to_string(),
        authorization: authorization(&headers),
        json: None,
        upload,
    });
    let response = state.upload_response.lock().unwrap().clone();
    reply(response)
}

async fn create_handler(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.record(RecordedRequest {
        method: "POST",
        path: "/predictions".to_string(),
        authorization: authorization(&headers),
        json: Some(body),
        upload: None,
    });
    let response = state.create_response.lock().unwrap().clone();
    reply(response)
}

async fn status_handler(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    state.record(RecordedRequest {
        method: "GET",
        path: format!("/predictions/{}", id),
        authorization: authorization(&headers),
        json: None,
        upload: None,
    });
    if state.hang_status.load(Ordering::SeqCst) {
        std::future::pending::<()>().await;
    }
    let next = state.statuses.lock().unwrap().pop_front();
    reply(next.unwrap_or_else(|| (200, json!({ "id": id, "status": "processing" }))))
}

/// Settings that poll without waiting.
pub fn fast_settings(image_mode: ImageMode, poll_max_attempts: u32) -> GenerationSettings {
    GenerationSettings {
        image_mode,
        poll_interval: Duration::ZERO,
        poll_max_attempts,
        submission_timeout: Duration::from_secs(10),
        ..Default::default()
    }
}

/// Build the API router wired to the mock Replicate server.
pub fn build_app(mock: &MockReplicate, settings: GenerationSettings, upload_dir: PathBuf) -> Router {
    let orchestrator = Orchestrator::new(Arc::new(mock.client()), Arc::new(TokioSleeper), settings);
    let state = AppState::new(orchestrator, PromptCatalog::builtin(), upload_dir);
    routes::router(state, 10 * 1024 * 1024, None)
}

/// A part of a multipart form.
pub enum FormPart<'a> {
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

pub fn multipart_request(uri: &str, parts: &[FormPart<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            FormPart::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, file_name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
            FormPart::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Split a response into its status and JSON body.
pub async fn json_response(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

/// Number of files left in the upload directory.
pub fn staged_files(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}
