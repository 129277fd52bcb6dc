#[path = "../common/mod.rs"]
mod common;

use adforge::services::google_ai::{
    with_retry, CallRequest, GenerativeModel, GoogleAiError, RetryError, RetryPolicy,
    DEFAULT_TEXT_MODEL,
};
use adforge::services::GenerationService;
use common::{Outcome, ScriptedModel};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn request() -> CallRequest {
    CallRequest::text(DEFAULT_TEXT_MODEL, "Write a hook for tired parents")
}

#[tokio::test(start_paused = true)]
async fn test_always_retryable_makes_exactly_max_attempts() {
    for max_attempts in [1u32, 2, 5] {
        let model = ScriptedModel::new(vec![Outcome::Status(429)]);
        let service = GenerationService::new(
            model,
            RetryPolicy::new(max_attempts, Duration::from_millis(100)),
        );

        let error = service.call_with_retry(&request()).await.unwrap_err();

        assert_eq!(service.model().attempt_count(), max_attempts as usize);
        match error {
            RetryError::ExhaustedRetries {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, max_attempts);
                assert_eq!(last_error.status_code(), Some(429));
                assert!(last_error.to_string().contains("scripted 429"));
            }
            other => panic!("Expected ExhaustedRetries, got {other:?}"),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_fatal_failure_is_not_retried() {
    let model = ScriptedModel::new(vec![Outcome::Status(400), Outcome::Ok("never".to_string())]);
    let service = GenerationService::new(model, RetryPolicy::new(10, Duration::from_millis(1000)));

    let started = Instant::now();
    let error = service.call_with_retry(&request()).await.unwrap_err();

    assert_eq!(service.model().attempt_count(), 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert!(error.is_fatal());
    match error {
        RetryError::Fatal { source } => {
            assert!(matches!(source, GoogleAiError::InvalidRequest { status: 400, .. }));
        }
        other => panic!("Expected Fatal, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_backoff_doubles_from_base_delay() {
    let model = ScriptedModel::new(vec![Outcome::Status(503)]);
    let service = GenerationService::new(model, RetryPolicy::new(4, Duration::from_millis(1000)));

    let _ = service.call_with_retry(&request()).await;

    let gaps = service.model().gaps_ms();
    assert_eq!(gaps.len(), 3);
    for (gap, expected) in gaps.iter().zip([1000u128, 2000, 4000]) {
        assert!(
            *gap >= expected && *gap < expected + 10,
            "gap {gap}ms, expected {expected}ms"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_success_on_second_attempt_stops_retrying() {
    let model = ScriptedModel::new(vec![
        Outcome::Network("TypeError: Failed to fetch"),
        Outcome::Ok("The 2 AM wake-up".to_string()),
        Outcome::Status(503),
    ]);
    let service = GenerationService::new(model, RetryPolicy::new(5, Duration::from_millis(200)));

    let result = service.call_with_retry(&request()).await.unwrap();

    assert_eq!(result.text, "The 2 AM wake-up");
    assert_eq!(service.model().attempt_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_overloaded_twice_then_success() {
    let model = ScriptedModel::new(vec![
        Outcome::Status(503),
        Outcome::Status(503),
        Outcome::Ok("{\"headline\":\"Sleep is a skill\"}".to_string()),
    ]);
    let service = GenerationService::new(model, RetryPolicy::new(3, Duration::from_millis(500)));

    let started = Instant::now();
    let result = service.call_with_retry(&request()).await.unwrap();

    assert!(started.elapsed() >= Duration::from_millis(1500));
    assert_eq!(service.model().attempt_count(), 3);
    assert_eq!(result.text, "{\"headline\":\"Sleep is a skill\"}");
    assert_eq!(result.usage.input_tokens, 10);
    assert_eq!(result.usage.output_tokens, 20);
}

#[tokio::test(start_paused = true)]
async fn test_bad_request_is_fatal_tagged() {
    let model = ScriptedModel::new(vec![Outcome::Status(400)]);
    let service = GenerationService::new(model, RetryPolicy::new(3, Duration::from_millis(500)));

    let error = service.call_with_retry(&request()).await.unwrap_err();

    assert_eq!(service.model().attempt_count(), 1);
    assert!(error.is_fatal());
    assert_eq!(error.source_error().and_then(|e| e.status_code()), Some(400));
}

#[tokio::test(start_paused = true)]
async fn test_single_attempt_never_sleeps() {
    let model = ScriptedModel::new(vec![Outcome::Status(503)]);
    let service = GenerationService::new(model, RetryPolicy::no_retry());

    let started = Instant::now();
    let error = service.call_with_retry(&request()).await.unwrap_err();

    assert_eq!(started.elapsed(), Duration::ZERO);
    assert!(error.is_exhausted());
    assert_eq!(service.model().attempt_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_generic_wrapper_calls_operation_fresh_each_attempt() {
    let model = Arc::new(ScriptedModel::new(vec![
        Outcome::Status(429),
        Outcome::Ok("ok".to_string()),
    ]));
    let request = request();

    let result = with_retry(RetryPolicy::new(3, Duration::from_millis(50)), || {
        model.generate_once(&request)
    })
    .await
    .unwrap();

    assert_eq!(result.text, "ok");
    assert_eq!(model.attempt_count(), 2);
}
