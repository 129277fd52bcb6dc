use thiserror::Error;

/// Message fragments that identify a transport-level failure when no HTTP
/// status is available.
const NETWORK_FAILURE_SIGNATURES: &[&str] = &[
    "fetch",
    "response",
    "error sending request",
    "connect",
    "timed out",
    "timeout",
    "dns",
    "broken pipe",
    "unexpected eof",
    "body",
];

/// Whether a failed call is worth repeating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClassification {
    Retryable,
    Fatal,
}

#[derive(Debug, Error)]
pub enum GoogleAiError {
    #[error("Authentication failed ({status}): {message}")]
    AuthenticationFailed { status: u16, message: String },

    #[error("Rate limit exceeded: {message}")]
    RateLimitExceeded { message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Invalid request ({status}): {message}")]
    InvalidRequest { status: u16, message: String },

    #[error("Content blocked by safety filters: {reason}")]
    ContentBlocked { reason: String },

    #[error("Quota exceeded: {message}")]
    QuotaExceeded { message: String },

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String },

    #[error("Parse error: {message}")]
    ParseError { message: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },
}

impl GoogleAiError {
    /// HTTP status (or API error code) carried by this failure, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            GoogleAiError::AuthenticationFailed { status, .. }
            | GoogleAiError::InvalidRequest { status, .. }
            | GoogleAiError::ServerError { status, .. } => Some(*status),
            GoogleAiError::RateLimitExceeded { .. } => Some(429),
            GoogleAiError::QuotaExceeded { .. } => Some(403),
            GoogleAiError::ServiceUnavailable { .. } => Some(503),
            GoogleAiError::Network { .. }
            | GoogleAiError::ContentBlocked { .. }
            | GoogleAiError::ParseError { .. }
            | GoogleAiError::ConfigurationError { .. } => None,
        }
    }

    /// Retryable on HTTP 429, HTTP 503, or a transport failure whose message
    /// matches a known network signature. Everything else is fatal.
    pub fn classify(&self) -> ErrorClassification {
        if matches!(self.status_code(), Some(429) | Some(503)) {
            return ErrorClassification::Retryable;
        }

        match self {
            GoogleAiError::Network { message } if is_network_failure(message) => {
                ErrorClassification::Retryable
            }
            _ => ErrorClassification::Fatal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.classify() == ErrorClassification::Retryable
    }

    pub fn is_rate_limit_error(&self) -> bool {
        matches!(self, GoogleAiError::RateLimitExceeded { .. })
    }

    pub fn is_network_error(&self) -> bool {
        matches!(self, GoogleAiError::Network { .. })
    }

    pub fn is_content_blocked(&self) -> bool {
        matches!(self, GoogleAiError::ContentBlocked { .. })
    }

    pub fn user_message(&self) -> String {
        match self {
            GoogleAiError::AuthenticationFailed { .. } => {
                "Google AI API authentication failed. Please check your API key.".to_string()
            }
            GoogleAiError::RateLimitExceeded { .. } => {
                "Google AI API rate limit exceeded. Please wait a moment and try again.".to_string()
            }
            GoogleAiError::Network { .. } => {
                "Network connection error. Please check your internet connection.".to_string()
            }
            GoogleAiError::ContentBlocked { .. } => {
                "Content was blocked by safety filters. Try rephrasing your request.".to_string()
            }
            GoogleAiError::QuotaExceeded { .. } => {
                "API quota exceeded. Please check your Google AI usage limits.".to_string()
            }
            GoogleAiError::ServerError { .. } => {
                "Google AI service is experiencing issues. Please try again later.".to_string()
            }
            GoogleAiError::ServiceUnavailable { .. } => {
                "Google AI service is temporarily overloaded. Please try again later.".to_string()
            }
            GoogleAiError::InvalidRequest { message, .. } => {
                format!("Invalid request: {message}")
            }
            GoogleAiError::ParseError { .. } => {
                "Error parsing Google AI response. Please try again.".to_string()
            }
            GoogleAiError::ConfigurationError { message } => {
                format!("Configuration error: {message}")
            }
        }
    }

    #[cfg(feature = "reqwest")]
    pub fn from_reqwest_error(error: reqwest::Error) -> Self {
        match error.status() {
            Some(status) => Self::from_status_and_body(status.as_u16(), &error.to_string()),
            None => GoogleAiError::Network {
                message: describe_transport_error(&error),
            },
        }
    }

    /// Builds an error from an HTTP status and the response body. The body's
    /// `error.code` wins over the transport status when present.
    pub fn from_status_and_body(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
        let error_object = parsed.as_ref().and_then(|value| value.get("error"));

        let message = error_object
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
            .unwrap_or(body)
            .to_string();

        let status_code = error_object
            .and_then(|e| e.get("code"))
            .and_then(|c| c.as_u64())
            .and_then(|c| u16::try_from(c).ok())
            .unwrap_or(status);

        match status_code {
            401 => GoogleAiError::AuthenticationFailed {
                status: status_code,
                message,
            },
            403 => {
                if message.to_lowercase().contains("quota") {
                    GoogleAiError::QuotaExceeded { message }
                } else {
                    GoogleAiError::AuthenticationFailed {
                        status: status_code,
                        message,
                    }
                }
            }
            429 => GoogleAiError::RateLimitExceeded { message },
            503 => GoogleAiError::ServiceUnavailable { message },
            500..=599 => GoogleAiError::ServerError {
                status: status_code,
                message,
            },
            _ => GoogleAiError::InvalidRequest {
                status: status_code,
                message,
            },
        }
    }
}

fn is_network_failure(message: &str) -> bool {
    let lower = message.to_lowercase();
    NETWORK_FAILURE_SIGNATURES
        .iter()
        .any(|signature| lower.contains(signature))
}

// reqwest's Display hides the underlying cause; walk the source chain so the
// classifier sees "connection refused" and friends.
#[cfg(feature = "reqwest")]
fn describe_transport_error(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    if error.is_timeout() && !message.to_lowercase().contains("timed out") {
        message.push_str(" (timed out)");
    }
    message
}

/// Outcome of a retried call that did not produce a value.
#[derive(Debug, Error)]
pub enum RetryError {
    #[error("Non-retryable error: {source}")]
    Fatal { source: GoogleAiError },

    #[error("Retries exhausted after {attempts} attempts: {last_error}")]
    ExhaustedRetries {
        attempts: u32,
        last_error: GoogleAiError,
    },

    #[error("Call cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },
}

impl RetryError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, RetryError::Fatal { .. })
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::ExhaustedRetries { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RetryError::Cancelled { .. })
    }

    /// The underlying API failure, unless the call was cancelled.
    pub fn source_error(&self) -> Option<&GoogleAiError> {
        match self {
            RetryError::Fatal { source } => Some(source),
            RetryError::ExhaustedRetries { last_error, .. } => Some(last_error),
            RetryError::Cancelled { .. } => None,
        }
    }

    pub fn into_source_error(self) -> Option<GoogleAiError> {
        match self {
            RetryError::Fatal { source } => Some(source),
            RetryError::ExhaustedRetries { last_error, .. } => Some(last_error),
            RetryError::Cancelled { .. } => None,
        }
    }
}
