use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::config::GenerationSettings;
use crate::services::image_ref::RemoteImageReference;
use crate::services::staging::StagedImage;

/// One inbound generation request. Owns the staged image until the
/// orchestrator releases it.
#[derive(Debug)]
pub struct GenerationRequest {
    pub image: StagedImage,
    pub style_key: Option<String>,
}

impl GenerationRequest {
    pub fn new(image: StagedImage, style_key: Option<String>) -> Self {
        Self { image, style_key }
    }
}

/// Result of a successful generation.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub job_id: String,
    pub image_url: String,
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Body of the prediction creation call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionRequest {
    pub version: String,
    pub input: PredictionInput,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionInput {
    pub prompt: String,
    pub input_image: String,
    pub aspect_ratio: String,
    pub output_format: String,
    pub safety_tolerance: u8,
}

impl PredictionRequest {
    pub fn new(
        settings: &GenerationSettings,
        prompt: &str,
        image: &RemoteImageReference,
    ) -> Self {
        let params = &settings.hyperparameters;
        Self {
            version: settings.model_version.clone(),
            input: PredictionInput {
                prompt: prompt.to_string(),
                input_image: image.as_str().to_string(),
                aspect_ratio: params.aspect_ratio.clone(),
                output_format: params.output_format.clone(),
                safety_tolerance: params.safety_tolerance,
            },
        }
    }
}

/// Response after a successful generation.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    pub success: bool,
    pub image_url: String,
}

/// JSON error envelope returned for every failed request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}
