use garde::Validate;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use strum::{Display, EnumString};

pub mod prompts;

use prompts::PromptCatalog;

/// How the source image is handed to the generation model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ImageMode {
    /// Upload to the remote file store first and pass the returned URL.
    Uploaded,
    /// Embed the bytes as a base64 data URI in the prediction input.
    Inline,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000")
    #[serde(default = "default_bind_addr")]
    #[garde(length(min = 1))]
    pub bind_addr: String,

    /// Replicate API token
    #[garde(length(min = 1))]
    pub replicate_api_key: String,

    /// Replicate API base URL, without trailing slash
    #[serde(default = "default_api_base")]
    #[garde(length(min = 1))]
    pub replicate_api_base: String,

    /// Model reference sent as the prediction `version`
    #[serde(default = "default_model_version")]
    #[garde(length(min = 1))]
    pub model_version: String,

    #[serde(default = "default_image_mode")]
    #[garde(skip)]
    pub image_mode: ImageMode,

    #[serde(default = "default_aspect_ratio")]
    #[garde(length(min = 1))]
    pub aspect_ratio: String,

    #[serde(default = "default_output_format")]
    #[garde(length(min = 1))]
    pub output_format: String,

    #[serde(default = "default_safety_tolerance")]
    #[garde(range(max = 6))]
    pub safety_tolerance: u8,

    /// Deadline for the prediction creation call
    #[serde(default = "default_submission_timeout_ms")]
    #[garde(range(min = 1))]
    pub submission_timeout_ms: u64,

    /// Deadline for each file upload and status request
    #[serde(default = "default_request_timeout_ms")]
    #[garde(range(min = 1))]
    pub request_timeout_ms: u64,

    /// Delay before each prediction status request
    #[serde(default = "default_poll_interval_ms")]
    #[garde(skip)]
    pub poll_interval_ms: u64,

    /// Status requests issued before giving up
    #[serde(default = "default_poll_max_attempts")]
    #[garde(range(min = 1))]
    pub poll_max_attempts: u32,

    /// Directory for staged uploads. Defaults to a folder under the system temp dir.
    #[serde(default)]
    #[garde(skip)]
    pub upload_dir: Option<PathBuf>,

    #[serde(default = "default_max_upload_bytes")]
    #[garde(range(min = 1))]
    pub max_upload_bytes: usize,

    /// Optional JSON file replacing the built-in prompt catalog
    #[serde(default)]
    #[garde(skip)]
    pub prompt_catalog_path: Option<PathBuf>,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_api_base() -> String {
    "https://api.replicate.com/v1".to_string()
}

fn default_model_version() -> String {
    "black-forest-labs/flux-kontext-pro".to_string()
}

fn default_image_mode() -> ImageMode {
    ImageMode::Uploaded
}

fn default_aspect_ratio() -> String {
    "match_input_image".to_string()
}

fn default_output_format() -> String {
    "jpg".to_string()
}

fn default_safety_tolerance() -> u8 {
    2
}

fn default_submission_timeout_ms() -> u64 {
    180_000
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_poll_max_attempts() -> u32 {
    180
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config: Self = envy::from_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.upload_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("image-restyle-uploads"))
    }

    /// Build the prompt catalog, from `prompt_catalog_path` when set.
    pub fn prompt_catalog(&self) -> Result<PromptCatalog, ConfigError> {
        match &self.prompt_catalog_path {
            Some(path) => PromptCatalog::from_file(path),
            None => Ok(PromptCatalog::builtin()),
        }
    }

    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            image_mode: self.image_mode,
            model_version: self.model_version.clone(),
            hyperparameters: Hyperparameters {
                aspect_ratio: self.aspect_ratio.clone(),
                output_format: self.output_format.clone(),
                safety_tolerance: self.safety_tolerance,
            },
            submission_timeout: Duration::from_millis(self.submission_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            poll_max_attempts: self.poll_max_attempts,
        }
    }
}

/// Fixed generation parameters sent with every prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct Hyperparameters {
    pub aspect_ratio: String,
    pub output_format: String,
    pub safety_tolerance: u8,
}

/// Everything the orchestrator needs to run one generation. Deployment
/// variants differ only in these values.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub image_mode: ImageMode,
    pub model_version: String,
    pub hyperparameters: Hyperparameters,
    pub submission_timeout: Duration,
    /// Deadline for the upload and for each status request.
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub poll_max_attempts: u32,
}

impl GenerationSettings {
    /// Longest time a single request can spend in the orchestrator.
    pub fn worst_case_duration(&self) -> Duration {
        self.request_timeout
            + self.submission_timeout
            + (self.poll_interval + self.request_timeout) * self.poll_max_attempts
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            image_mode: default_image_mode(),
            model_version: default_model_version(),
            hyperparameters: Hyperparameters {
                aspect_ratio: default_aspect_ratio(),
                output_format: default_output_format(),
                safety_tolerance: default_safety_tolerance(),
            },
            submission_timeout: Duration::from_millis(default_submission_timeout_ms()),
            request_timeout: Duration::from_millis(default_request_timeout_ms()),
            poll_interval: Duration::from_millis(default_poll_interval_ms()),
            poll_max_attempts: default_poll_max_attempts(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read environment: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] garde::Report),

    #[error("Failed to read prompt catalog: {0}")]
    CatalogIo(#[from] std::io::Error),

    #[error("Failed to parse prompt catalog: {0}")]
    CatalogParse(#[from] serde_json::Error),

    #[error("Prompt catalog has an empty default prompt")]
    EmptyDefaultPrompt,
}
