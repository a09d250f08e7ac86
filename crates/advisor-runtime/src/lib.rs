//! # advisor-runtime
//!
//! Runtime providers for the coin advisor.
//!
//! ## Providers
//!
//! - **Ollama** (default): Local LLM inference via Ollama
//! - **Gemini**: Google Generative Language API
//!
//! ## Usage
//!
//! ```rust,ignore
//! use advisor_runtime::provider_from_env;
//!
//! // LLM_PROVIDER=gemini|ollama
//! let provider = provider_from_env()?;
//! let completion = provider.complete(&messages, &options).await?;
//! ```

use std::sync::Arc;

#[cfg(feature = "ollama")]
pub mod ollama;
pub mod gemini;

#[cfg(feature = "ollama")]
pub use ollama::OllamaProvider;
pub use gemini::GeminiProvider;

// Re-export core types for convenience
pub use advisor_core::{
    Completion, Conversation, GenerationOptions, LlmError, LlmProvider, Message, Result, Role,
};

/// Build the provider named by `LLM_PROVIDER` (defaults to Ollama)
pub fn provider_from_env() -> Result<Arc<dyn LlmProvider>> {
    let name = std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "ollama".into());
    provider_by_name(&name)
}

fn provider_by_name(name: &str) -> Result<Arc<dyn LlmProvider>> {
    match name.trim().to_ascii_lowercase().as_str() {
        "gemini" | "google" => Ok(Arc::new(GeminiProvider::from_env()?)),
        #[cfg(feature = "ollama")]
        "ollama" => Ok(Arc::new(OllamaProvider::from_env())),
        other => Err(LlmError::Config(format!("Unknown LLM provider: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_provider_rejected() {
        let err = provider_by_name("clippy-9000").err().unwrap();
        assert!(matches!(err, LlmError::Config(_)));
    }

    #[cfg(feature = "ollama")]
    #[test]
    fn test_ollama_selected_by_name() {
        let provider = provider_by_name(" Ollama ").unwrap();
        assert_eq!(provider.name(), "Ollama");
    }
}
