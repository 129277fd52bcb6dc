use adforge::services::google_ai::{ErrorClassification, GoogleAiError, RetryError};
use adforge::AdForgeError;

fn api_error(status: u16) -> GoogleAiError {
    GoogleAiError::from_status_and_body(status, "upstream said no")
}

#[test]
fn test_retryable_statuses() {
    for status in [429, 503] {
        assert_eq!(
            api_error(status).classify(),
            ErrorClassification::Retryable,
            "status {status}"
        );
    }
}

#[test]
fn test_fatal_statuses() {
    for status in [400, 401, 403, 404, 500, 502, 504] {
        assert_eq!(
            api_error(status).classify(),
            ErrorClassification::Fatal,
            "status {status}"
        );
    }
}

#[test]
fn test_status_mapping() {
    assert!(matches!(api_error(401), GoogleAiError::AuthenticationFailed { status: 401, .. }));
    assert!(api_error(429).is_rate_limit_error());
    assert!(matches!(api_error(503), GoogleAiError::ServiceUnavailable { .. }));
    assert!(matches!(api_error(500), GoogleAiError::ServerError { status: 500, .. }));
    assert!(matches!(api_error(404), GoogleAiError::InvalidRequest { status: 404, .. }));
}

#[test]
fn test_network_signatures_are_retryable() {
    for message in [
        "TypeError: Failed to fetch",
        "error sending request for url (https://example.test/)",
        "tcp connect error: Connection refused (os error 111)",
        "operation timed out",
        "dns error: failed to lookup address information",
        "error decoding response body",
    ] {
        let error = GoogleAiError::Network {
            message: message.to_string(),
        };
        assert!(error.is_retryable(), "message {message:?}");
    }
}

#[test]
fn test_unrecognized_failures_are_fatal() {
    let opaque = GoogleAiError::Network {
        message: "builder error".to_string(),
    };
    assert_eq!(opaque.classify(), ErrorClassification::Fatal);

    for error in [
        GoogleAiError::ContentBlocked {
            reason: "SAFETY".to_string(),
        },
        GoogleAiError::ParseError {
            message: "expected value at line 1".to_string(),
        },
        GoogleAiError::ConfigurationError {
            message: "missing key".to_string(),
        },
    ] {
        assert!(!error.is_retryable(), "{error:?}");
    }
}

#[test]
fn test_retry_error_display_keeps_cause() {
    let exhausted = RetryError::ExhaustedRetries {
        attempts: 3,
        last_error: api_error(503),
    };
    let message = exhausted.to_string();
    assert!(message.contains("3 attempts"));
    assert!(message.contains("upstream said no"));

    let fatal = RetryError::Fatal {
        source: api_error(400),
    };
    assert!(fatal.to_string().contains("upstream said no"));
    assert_eq!(fatal.into_source_error().and_then(|e| e.status_code()), Some(400));
}

#[test]
fn test_app_error_wraps_retry_error() {
    let error: AdForgeError = RetryError::Cancelled { attempts: 1 }.into();
    assert!(matches!(error, AdForgeError::Generation(_)));
    assert!(!error.is_retryable());

    let error: AdForgeError = api_error(429).into();
    assert!(error.is_retryable());
}
