use thiserror::Error;

use crate::services::google_ai::{GoogleAiError, RetryError};

/// Crate-level error type
#[derive(Error, Debug)]
pub enum AdForgeError {
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Google AI error: {0}")]
    GoogleAi(#[from] GoogleAiError),

    #[error("Generation failed: {0}")]
    Generation(#[from] RetryError),

    #[error("Validation error: {field}: {message}")]
    Validation { field: String, message: String },
}

impl AdForgeError {
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn validation<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether the failure came from a transient API condition
    pub fn is_retryable(&self) -> bool {
        match self {
            AdForgeError::GoogleAi(error) => error.is_retryable(),
            AdForgeError::Generation(RetryError::ExhaustedRetries { .. }) => true,
            _ => false,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            AdForgeError::GoogleAi(error) => error.user_message(),
            AdForgeError::Generation(error) => match error.source_error() {
                Some(source) if error.is_exhausted() => {
                    format!("Gave up after repeated failures. {}", source.user_message())
                }
                Some(source) => source.user_message(),
                None => "The request was cancelled.".to_string(),
            },
            other => other.to_string(),
        }
    }
}

/// Result type alias for adforge operations
pub type Result<T> = std::result::Result<T, AdForgeError>;
