//! Remote job orchestration: externalize the image, submit a prediction,
//! poll it to a terminal state and extract the output URL.

use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;

use crate::config::{GenerationSettings, ImageMode};
use crate::error::{GenerationError, RemoteFailure};
use crate::models::generation::{GeneratedImage, GenerationRequest, PredictionRequest};
use crate::models::job::JobStatus;
use crate::services::clock::Sleeper;
use crate::services::image_ref::RemoteImageReference;
use crate::services::replicate::PredictionApi;
use crate::services::staging::StagedImage;

/// Drives one generation from staged upload to output URL.
///
/// Holds no per-request state; a single instance is shared by all handlers.
pub struct Orchestrator {
    api: Arc<dyn PredictionApi>,
    sleeper: Arc<dyn Sleeper>,
    settings: GenerationSettings,
}

/// Output of a prediction that reached `succeeded`.
struct Completed {
    output: Option<Value>,
    attempts: u32,
}

impl Orchestrator {
    pub fn new(
        api: Arc<dyn PredictionApi>,
        sleeper: Arc<dyn Sleeper>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            api,
            sleeper,
            settings,
        }
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// Run the full pipeline for `request` with the resolved `prompt`.
    ///
    /// The staged image is released on every exit path.
    pub async fn generate(
        &self,
        request: GenerationRequest,
        prompt: &str,
    ) -> Result<GeneratedImage, GenerationError> {
        let started = Instant::now();
        let GenerationRequest { image, style_key } = request;

        metrics::counter!("generation_requests_total").increment(1);
        tracing::info!(
            scene = style_key.as_deref().unwrap_or("default"),
            image_mode = %self.settings.image_mode,
            model = %self.settings.model_version,
            "Starting generation"
        );

        let outcome = self.run(&image, prompt, started).await;

        let staged_path = image.path().display().to_string();
        match image.release() {
            Ok(()) => tracing::debug!(path = %staged_path, "Deleted staged image"),
            Err(e) => tracing::warn!(path = %staged_path, error = %e, "Failed to delete staged image"),
        }

        match &outcome {
            Ok(generated) => {
                metrics::histogram!("generation_duration_seconds")
                    .record(generated.elapsed.as_secs_f64());
                metrics::counter!("generation_jobs_completed").increment(1);
                tracing::info!(
                    job_id = %generated.job_id,
                    attempts = generated.attempts,
                    elapsed_ms = generated.elapsed.as_millis() as u64,
                    image_url = %generated.image_url,
                    "Generation complete"
                );
            }
            Err(e) => {
                let elapsed = started.elapsed();
                let details = e.details().unwrap_or(Value::Null);
                metrics::histogram!("generation_duration_seconds").record(elapsed.as_secs_f64());
                metrics::counter!("generation_jobs_failed", "kind" => e.kind()).increment(1);
                tracing::error!(
                    stage = e.stage(),
                    kind = e.kind(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    details = %details,
                    error = %e,
                    "Generation failed"
                );
            }
        }

        outcome
    }

    async fn run(
        &self,
        image: &StagedImage,
        prompt: &str,
        started: Instant,
    ) -> Result<GeneratedImage, GenerationError> {
        let reference = self.resolve_reference(image).await?;
        let job_id = self.submit(&reference, prompt).await?;
        let completed = self.poll(&job_id).await?;

        let image_url = normalize_output(completed.output.as_ref()).ok_or_else(|| {
            GenerationError::NoOutput {
                job_id: job_id.clone(),
                output: completed.output.clone().unwrap_or(Value::Null),
            }
        })?;

        Ok(GeneratedImage {
            job_id,
            image_url,
            attempts: completed.attempts,
            elapsed: started.elapsed(),
        })
    }

    /// Turn the staged image into something the remote model can read.
    async fn resolve_reference(
        &self,
        image: &StagedImage,
    ) -> Result<RemoteImageReference, GenerationError> {
        let bytes = image.read().await?;

        match self.settings.image_mode {
            ImageMode::Inline => Ok(RemoteImageReference::inline(&bytes, image.mime_type())),
            ImageMode::Uploaded => {
                tracing::debug!(bytes = bytes.len(), "Uploading image to remote file store");
                let url = self
                    .remote_call(self.api.upload_file(bytes, image.file_name(), image.mime_type()))
                    .await
                    .map_err(GenerationError::Upload)?;
                tracing::info!(url = %url, "Image uploaded");
                Ok(RemoteImageReference::Url(url))
            }
        }
    }

    /// Create the prediction under the submission deadline.
    async fn submit(
        &self,
        reference: &RemoteImageReference,
        prompt: &str,
    ) -> Result<String, GenerationError> {
        let request = PredictionRequest::new(&self.settings, prompt, reference);
        let timeout = self.settings.submission_timeout;
        tracing::debug!(
            version = %request.version,
            input_image = %reference.describe(),
            "Submitting prediction"
        );

        let job_id = tokio::time::timeout(timeout, self.api.create_prediction(&request))
            .await
            .map_err(|_| GenerationError::SubmissionTimeout {
                timeout_ms: timeout.as_millis() as u64,
            })?
            .map_err(GenerationError::SubmissionRejected)?;

        tracing::info!(job_id = %job_id, "Prediction created");
        Ok(job_id)
    }

    /// Poll the prediction until it succeeds, fails or the attempts run out.
    async fn poll(&self, job_id: &str) -> Result<Completed, GenerationError> {
        let started = Instant::now();
        let max_attempts = self.settings.poll_max_attempts;

        for attempt in 1..=max_attempts {
            self.sleeper.sleep(self.settings.poll_interval).await;

            let job = self
                .remote_call(self.api.get_prediction(job_id))
                .await
                .map_err(|failure| GenerationError::PollTransport {
                    job_id: job_id.to_string(),
                    attempt,
                    failure,
                })?;

            tracing::debug!(job_id = %job_id, attempt, status = %job.status, "Polled prediction");

            if !job.status.is_terminal() {
                if let JobStatus::Unrecognized(raw) = &job.status {
                    tracing::warn!(job_id = %job_id, attempt, status = %raw, "Unrecognized prediction status, still waiting");
                }
                continue;
            }

            metrics::histogram!("generation_poll_attempts").record(attempt as f64);
            if job.status == JobStatus::Failed {
                return Err(GenerationError::JobFailed {
                    job_id: job_id.to_string(),
                    error: job.error.unwrap_or(Value::Null),
                });
            }
            return Ok(Completed {
                output: job.output,
                attempts: attempt,
            });
        }

        metrics::histogram!("generation_poll_attempts").record(max_attempts as f64);
        Err(GenerationError::PollTimeout {
            job_id: job_id.to_string(),
            attempts: max_attempts,
            elapsed: started.elapsed(),
        })
    }

    /// Bound a single upload or status request by `request_timeout`.
    async fn remote_call<T>(
        &self,
        call: impl Future<Output = Result<T, RemoteFailure>>,
    ) -> Result<T, RemoteFailure> {
        let limit = self.settings.request_timeout;
        tokio::time::timeout(limit, call)
            .await
            .unwrap_or_else(|_| {
                Err(RemoteFailure::Timeout {
                    timeout_ms: limit.as_millis() as u64,
                })
            })
    }
}

/// Extract the generated image URL from a succeeded prediction's output.
///
/// A string is the URL; a list yields its first element. Anything else,
/// including empty strings and empty lists, has no usable output.
pub fn normalize_output(output: Option<&Value>) -> Option<String> {
    let url = match output? {
        Value::String(url) => url,
        Value::Array(items) => items.first()?.as_str()?,
        _ => return None,
    };
    (!url.is_empty()).then(|| url.to_string())
}
