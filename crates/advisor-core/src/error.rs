//! Error Types

use thiserror::Error;

/// Result type alias for language-model operations
pub type Result<T> = std::result::Result<T, LlmError>;

/// Language-model error types
#[derive(Error, Debug)]
pub enum LlmError {
    /// LLM provider error
    #[error("Provider error: {0}")]
    Provider(String),
    
    /// Provider unavailable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),
    
    /// Provider answered but the payload was unusable
    #[error("Empty completion from {0}")]
    EmptyCompletion(String),
    
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
    
    /// Rate limited
    #[error("Rate limited: {0}")]
    RateLimited(String),
    
    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),
    
    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    
    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl LlmError {
    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            LlmError::Provider(msg) => format!("The AI service encountered an error: {}", msg),
            LlmError::ProviderUnavailable(_) => "The AI service is currently unavailable. Please try again.".into(),
            LlmError::EmptyCompletion(_) => "The AI service returned an empty answer. Please try again.".into(),
            LlmError::RateLimited(_) => "You've made too many requests. Please wait a moment.".into(),
            LlmError::Auth(_) => "The AI service rejected our credentials.".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}
