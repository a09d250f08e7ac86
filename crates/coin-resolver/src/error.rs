//! Error Types for the Resolution Pipeline
//!
//! Resolver steps return these internally; none of them escape the
//! orchestrator; each degrades to "no quote from this source".

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ResolveError>;

#[derive(Error, Debug)]
pub enum ResolveError {
    /// Source answered but had no matching record
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network failure, 429 or 5xx
    #[error("Transient service error: {0}")]
    Transient(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Language-model extraction returned "none" or an unparsable answer
    #[error("Extraction ambiguous: {0}")]
    ExtractionAmbiguous(String),

    /// Non-retryable client error from an upstream (bad key, bad request)
    #[error("Upstream rejected request ({status}): {url}")]
    Rejected { status: u16, url: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Language model error: {0}")]
    Llm(#[from] advisor_core::LlmError),
}

impl ResolveError {
    /// Whether the failing call is worth repeating under the retry policy
    pub fn is_retryable(&self) -> bool {
        match self {
            ResolveError::Transient(_) => true,
            ResolveError::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }

    /// Expected misses are logged quietly; everything else is a warning
    pub fn is_miss(&self) -> bool {
        matches!(
            self,
            ResolveError::NotFound(_) | ResolveError::ExtractionAmbiguous(_)
        )
    }
}

/// Degrade a resolver step to `Option`, logging the failure against its source
pub(crate) fn degrade<T>(source: &'static str, subject: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) if e.is_miss() => {
            tracing::debug!(source, subject, error = %e, "source had no match");
            None
        }
        Err(e) => {
            tracing::warn!(source, subject, error = %e, "source failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_is_retryable() {
        assert!(ResolveError::Transient("503".into()).is_retryable());
        assert!(!ResolveError::NotFound("x".into()).is_retryable());
        assert!(!ResolveError::Rejected { status: 403, url: "u".into() }.is_retryable());
    }

    #[test]
    fn test_degrade_swallows_errors() {
        let miss: Result<u8> = Err(ResolveError::NotFound("pepe".into()));
        let broken: Result<u8> = Err(ResolveError::MalformedResponse("bad json".into()));

        assert_eq!(degrade("test", "pepe", miss), None);
        assert_eq!(degrade("test", "pepe", broken), None);
        assert_eq!(degrade("test", "pepe", Ok(7u8)), Some(7));
    }
}
