use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use std::time::Duration;

use crate::models::generation::ErrorResponse;

/// What went wrong on a single call to the remote API.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RemoteFailure {
    /// No HTTP response was received.
    #[error("request failed: {0}")]
    Transport(String),
    /// No response arrived before the per-call deadline.
    #[error("no response within {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    /// The remote answered with a non-success status.
    #[error("remote returned status {status}")]
    Status { status: u16, body: String },
    /// The response arrived but lacked the expected fields.
    #[error("unexpected response: {reason}")]
    Malformed { body: String, reason: String },
}

impl RemoteFailure {
    pub fn details(&self) -> Value {
        match self {
            RemoteFailure::Transport(message) => json!({ "transport": message }),
            RemoteFailure::Timeout { timeout_ms } => json!({ "timeout_ms": timeout_ms }),
            RemoteFailure::Status { status, body } => json!({
                "status": status,
                "body": body_as_json(body),
            }),
            RemoteFailure::Malformed { body, reason } => json!({
                "reason": reason,
                "body": body_as_json(body),
            }),
        }
    }
}

/// Remote bodies are usually JSON; keep them structured when they are.
fn body_as_json(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("No image uploaded")]
    MissingInput,

    #[error("Invalid multipart request: {0}")]
    InvalidForm(String),

    #[error("Image exceeds the upload size limit: {0}")]
    PayloadTooLarge(String),

    #[error("Unsupported image format")]
    UnsupportedMedia,

    #[error("Failed to stage uploaded image: {0}")]
    Staging(#[from] std::io::Error),

    #[error("Image upload failed: {0}")]
    Upload(RemoteFailure),

    #[error("Prediction submission rejected: {0}")]
    SubmissionRejected(RemoteFailure),

    #[error("Prediction submission timed out after {timeout_ms}ms")]
    SubmissionTimeout { timeout_ms: u64 },

    #[error("Status check {attempt} for prediction {job_id} failed: {failure}")]
    PollTransport {
        job_id: String,
        attempt: u32,
        failure: RemoteFailure,
    },

    #[error("Prediction {job_id} did not finish after {attempts} status checks ({:.1}s)", .elapsed.as_secs_f64())]
    PollTimeout {
        job_id: String,
        attempts: u32,
        elapsed: Duration,
    },

    #[error("Prediction {job_id} failed: {error}")]
    JobFailed { job_id: String, error: Value },

    #[error("Prediction {job_id} succeeded without a usable output")]
    NoOutput { job_id: String, output: Value },
}

impl GenerationError {
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::MissingInput => "missing_input",
            GenerationError::InvalidForm(_) => "invalid_form",
            GenerationError::PayloadTooLarge(_) => "payload_too_large",
            GenerationError::UnsupportedMedia => "unsupported_media",
            GenerationError::Staging(_) => "staging",
            GenerationError::Upload(_) => "upload",
            GenerationError::SubmissionRejected(_) => "submission_rejected",
            GenerationError::SubmissionTimeout { .. } => "submission_timeout",
            GenerationError::PollTransport { .. } => "poll_transport",
            GenerationError::PollTimeout { .. } => "poll_timeout",
            GenerationError::JobFailed { .. } => "job_failed",
            GenerationError::NoOutput { .. } => "no_output",
        }
    }

    /// Pipeline stage the error belongs to, for logs.
    pub fn stage(&self) -> &'static str {
        match self {
            GenerationError::MissingInput
            | GenerationError::InvalidForm(_)
            | GenerationError::PayloadTooLarge(_)
            | GenerationError::UnsupportedMedia
            | GenerationError::Staging(_) => "ingress",
            GenerationError::Upload(_) => "upload",
            GenerationError::SubmissionRejected(_) | GenerationError::SubmissionTimeout { .. } => {
                "submission"
            }
            GenerationError::PollTransport { .. }
            | GenerationError::PollTimeout { .. }
            | GenerationError::JobFailed { .. } => "poll",
            GenerationError::NoOutput { .. } => "output",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            GenerationError::MissingInput | GenerationError::InvalidForm(_) => {
                StatusCode::BAD_REQUEST
            }
            GenerationError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            GenerationError::UnsupportedMedia => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Most specific diagnostic available for the caller.
    pub fn details(&self) -> Option<Value> {
        match self {
            GenerationError::MissingInput | GenerationError::UnsupportedMedia => None,
            GenerationError::InvalidForm(message) | GenerationError::PayloadTooLarge(message) => {
                Some(Value::String(message.clone()))
            }
            GenerationError::Staging(e) => Some(Value::String(e.to_string())),
            GenerationError::Upload(failure) | GenerationError::SubmissionRejected(failure) => {
                Some(failure.details())
            }
            GenerationError::SubmissionTimeout { timeout_ms } => Some(json!({
                "message": self.to_string(),
                "timeout_ms": timeout_ms,
            })),
            GenerationError::PollTransport {
                job_id,
                attempt,
                failure,
            } => Some(json!({
                "job_id": job_id,
                "attempt": attempt,
                "failure": failure.details(),
            })),
            GenerationError::PollTimeout {
                job_id,
                attempts,
                elapsed,
            } => Some(json!({
                "message": self.to_string(),
                "job_id": job_id,
                "attempts": attempts,
                "elapsed_ms": elapsed.as_millis() as u64,
            })),
            GenerationError::JobFailed { error, .. } => Some(error.clone()),
            GenerationError::NoOutput { job_id, output } => Some(json!({
                "job_id": job_id,
                "output": output,
            })),
        }
    }

    fn envelope(&self) -> ErrorResponse {
        match self {
            GenerationError::MissingInput | GenerationError::UnsupportedMedia => ErrorResponse {
                error: self.to_string(),
                kind: None,
                details: None,
            },
            GenerationError::InvalidForm(_) => ErrorResponse {
                error: "Invalid multipart request".to_string(),
                kind: None,
                details: self.details(),
            },
            GenerationError::PayloadTooLarge(_) => ErrorResponse {
                error: "Image too large".to_string(),
                kind: None,
                details: self.details(),
            },
            _ => ErrorResponse {
                error: "Failed to generate image".to_string(),
                kind: Some(self.kind().to_string()),
                details: self.details(),
            },
        }
    }
}

impl IntoResponse for GenerationError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.envelope())).into_response()
    }
}
