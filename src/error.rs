//! Error types for interview feedback synthesis and retrieval
//!
//! Structured error definitions use thiserror; anyhow is only accepted at the
//! binary edge and folded into [`FeedbackError::Other`].

use thiserror::Error;

/// Main error type for feedback operations
#[derive(Error, Debug)]
pub enum FeedbackError {
    /// Structured completion call failed or returned non-conformant data
    #[error("Completion error: {0}")]
    Completion(String),

    /// Document store read (get or query) failed
    #[error("Store read error: {0}")]
    StoreRead(String),

    /// Document store write failed
    #[error("Store write error: {0}")]
    StoreWrite(String),

    /// Uniform outcome reported by the feedback synthesizer
    #[error("Failed to synthesize feedback: {0}")]
    SynthesisFailed(String),

    /// Query could not be expressed against the backing store
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl FeedbackError {
    /// True for failures raised by the structured completion boundary
    pub fn is_completion_failure(&self) -> bool {
        matches!(self, FeedbackError::Completion(_) | FeedbackError::Http(_))
    }

    /// True for failures raised by the document store
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            FeedbackError::StoreRead(_) | FeedbackError::StoreWrite(_)
        )
    }
}

/// Result type alias for feedback operations
pub type Result<T> = std::result::Result<T, FeedbackError>;

/// Convert anyhow::Error to FeedbackError
impl From<anyhow::Error> for FeedbackError {
    fn from(err: anyhow::Error) -> Self {
        FeedbackError::Other(err.to_string())
    }
}
