use std::path::PathBuf;
use std::sync::Arc;

use crate::config::prompts::PromptCatalog;
use crate::services::orchestrator::Orchestrator;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub prompts: Arc<PromptCatalog>,
    pub upload_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, prompts: PromptCatalog, upload_dir: PathBuf) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            prompts: Arc::new(prompts),
            upload_dir: Arc::new(upload_dir),
        }
    }
}
