use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;

use crate::error::RemoteFailure;
use crate::models::generation::PredictionRequest;
use crate::models::job::{Job, JobStatus};

/// Remote prediction service used by the orchestrator.
#[async_trait]
pub trait PredictionApi: Send + Sync {
    /// Store `content` remotely and return a URL the model can fetch.
    async fn upload_file(
        &self,
        content: Vec<u8>,
        file_name: &str,
        mime_type: &str,
    ) -> Result<String, RemoteFailure>;

    /// Create a prediction and return its id.
    async fn create_prediction(&self, request: &PredictionRequest) -> Result<String, RemoteFailure>;

    /// Fetch the current state of a prediction.
    async fn get_prediction(&self, id: &str) -> Result<Job, RemoteFailure>;
}

/// Client for the Replicate HTTP API.
pub struct ReplicateClient {
    http: Client,
    api_base: String,
    api_key: String,
}

#[derive(Deserialize)]
struct FileResponse {
    urls: Option<FileUrls>,
}

#[derive(Deserialize)]
struct FileUrls {
    get: Option<String>,
}

#[derive(Deserialize)]
struct CreatedPrediction {
    id: Option<String>,
}

#[derive(Deserialize)]
struct PredictionResponse {
    status: String,
    #[serde(default)]
    output: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

impl ReplicateClient {
    pub fn new(api_base: &str, api_key: &str) -> Self {
        Self {
            http: Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    fn authorization(&self) -> String {
        format!("Token {}", self.api_key)
    }
}

/// Read the body of a response, turning non-2xx statuses into failures.
async fn success_body(response: Result<Response, reqwest::Error>) -> Result<String, RemoteFailure> {
    let response = response.map_err(|e| RemoteFailure::Transport(e.to_string()))?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| RemoteFailure::Transport(e.to_string()))?;

    if !status.is_success() {
        return Err(RemoteFailure::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

fn parse_body<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T, RemoteFailure> {
    serde_json::from_str(body).map_err(|e| RemoteFailure::Malformed {
        body: body.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl PredictionApi for ReplicateClient {
    async fn upload_file(
        &self,
        content: Vec<u8>,
        file_name: &str,
        mime_type: &str,
    ) -> Result<String, RemoteFailure> {
        let part = Part::bytes(content)
            .file_name(file_name.to_string())
            .mime_str(mime_type)
            .map_err(|e| RemoteFailure::Transport(e.to_string()))?;
        let form = Form::new().part("content", part);

        let response = self
            .http
            .post(self.url("files"))
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .multipart(form)
            .send()
            .await;
        let body = success_body(response).await?;

        let parsed: FileResponse = parse_body(&body)?;
        parsed
            .urls
            .and_then(|urls| urls.get)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| RemoteFailure::Malformed {
                body,
                reason: "missing urls.get".to_string(),
            })
    }

    async fn create_prediction(&self, request: &PredictionRequest) -> Result<String, RemoteFailure> {
        let response = self
            .http
            .post(self.url("predictions"))
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .json(request)
            .send()
            .await;
        let body = success_body(response).await?;

        let parsed: CreatedPrediction = parse_body(&body)?;
        parsed
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| RemoteFailure::Malformed {
                body,
                reason: "missing prediction id".to_string(),
            })
    }

    async fn get_prediction(&self, id: &str) -> Result<Job, RemoteFailure> {
        let response = self
            .http
            .get(self.url(&format!("predictions/{id}")))
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .send()
            .await;
        let body = success_body(response).await?;

        let parsed: PredictionResponse = parse_body(&body)?;
        Ok(Job {
            id: id.to_string(),
            status: JobStatus::from_remote(&parsed.status),
            output: parsed.output,
            error: parsed.error,
        })
    }
}
