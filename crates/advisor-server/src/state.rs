//! Application State

use std::sync::Arc;

use advisor_core::LlmProvider;
use coin_resolver::{ResolutionPipeline, SearchTracker};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// LLM provider for the advisory chat (Ollama, Gemini)
    pub provider: Arc<dyn LlmProvider>,

    /// Reference resolution pipeline
    pub pipeline: Arc<ResolutionPipeline>,

    /// Search counts behind `/api/trending`
    pub tracker: Arc<dyn SearchTracker>,

    /// Model used when a chat request names none
    pub default_model: String,
}
