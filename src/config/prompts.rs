use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use super::ConfigError;

const DEFAULT_PROMPT: &str =
    "Do a GTAV Loading screen art style version of this image. Keep all original Features.\n";

const BUILTIN_SCENES: &[(&str, &str)] = &[
    ("gta", DEFAULT_PROMPT),
    (
        "anime",
        "Redraw this image as a hand-drawn anime film still. Keep all original Features.\n",
    ),
    (
        "pixar",
        "Turn this image into a 3D animated movie render with soft lighting. Keep all original Features.\n",
    ),
    (
        "cyberpunk",
        "Restyle this image as neon-lit cyberpunk concept art at night. Keep all original Features.\n",
    ),
    (
        "watercolor",
        "Paint this image as a loose watercolor illustration on textured paper. Keep all original Features.\n",
    ),
];

/// Read-only mapping from scene name to prompt text.
///
/// Built once at startup and shared behind an `Arc`. Lookups never fail:
/// unknown, blank or absent scene names resolve to the default prompt.
#[derive(Debug, Clone)]
pub struct PromptCatalog {
    default_prompt: String,
    scenes: HashMap<String, String>,
}

/// On-disk catalog format for `PROMPT_CATALOG_PATH`.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    default: String,
    #[serde(default)]
    scenes: HashMap<String, String>,
}

impl PromptCatalog {
    pub fn new(default_prompt: impl Into<String>, scenes: HashMap<String, String>) -> Self {
        let scenes = scenes
            .into_iter()
            .map(|(key, prompt)| (normalize_key(&key), prompt))
            .collect();
        Self {
            default_prompt: default_prompt.into(),
            scenes,
        }
    }

    pub fn builtin() -> Self {
        let scenes = BUILTIN_SCENES
            .iter()
            .map(|(key, prompt)| (key.to_string(), prompt.to_string()))
            .collect();
        Self::new(DEFAULT_PROMPT, scenes)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let file: CatalogFile = serde_json::from_str(raw)?;
        if file.default.trim().is_empty() {
            return Err(ConfigError::EmptyDefaultPrompt);
        }
        Ok(Self::new(file.default, file.scenes))
    }

    /// Resolve a scene name to its prompt, falling back to the default.
    pub fn resolve(&self, scene: Option<&str>) -> &str {
        scene
            .and_then(|key| self.scenes.get(&normalize_key(key)))
            .map(String::as_str)
            .unwrap_or(self.default_prompt.as_str())
    }

    pub fn contains(&self, scene: &str) -> bool {
        self.scenes.contains_key(&normalize_key(scene))
    }

    pub fn default_prompt(&self) -> &str {
        &self.default_prompt
    }

    pub fn scene_names(&self) -> impl Iterator<Item = &str> {
        self.scenes.keys().map(String::as_str)
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}
