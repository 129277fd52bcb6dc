#[path = "../common/mod.rs"]
mod common;

use adforge::services::google_ai::{
    with_retry_cancellable, CallRequest, CallResult, GenerativeModel, GoogleAiError, InlineData,
    RetryError, RetryPolicy, DEFAULT_TEXT_MODEL, FLASH_IMAGE_MODEL,
};
use adforge::services::{Generation, GenerationService};
use async_trait::async_trait;
use common::{Outcome, ScriptedModel};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct CampaignBrief {
    #[serde(default)]
    product_name: String,
    #[serde(default)]
    pain_points: Vec<String>,
}

struct FixedImage;

#[async_trait]
impl GenerativeModel for FixedImage {
    async fn generate_once(&self, _request: &CallRequest) -> Result<CallResult, GoogleAiError> {
        Ok(CallResult::text("")
            .with_inline_data(InlineData::from_bytes("image/png", b"\x89PNG fake"))
            .with_usage(5, 1290))
    }

    fn provider_name(&self) -> &'static str {
        "fixed-image"
    }
}

#[tokio::test(start_paused = true)]
async fn test_structured_generation_through_retries() {
    let service = GenerationService::new(
        ScriptedModel::new(vec![
            Outcome::Network("error sending request: connection reset"),
            Outcome::Ok(
                "```json\n{\"productName\": \"DreamNest\", \"painPoints\": [\"night wakings\"]}\n```"
                    .to_string(),
            ),
        ]),
        RetryPolicy::new(3, Duration::from_millis(250)),
    );

    let brief: Generation<CampaignBrief> = service
        .generate_structured(&CallRequest::text(DEFAULT_TEXT_MODEL, "Analyze DreamNest"))
        .await
        .unwrap();

    assert_eq!(brief.data.product_name, "DreamNest");
    assert_eq!(brief.data.pain_points, vec!["night wakings"]);
    assert_eq!((brief.input_tokens, brief.output_tokens), (10, 20));
    assert_eq!(service.model().attempt_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_structured_output_is_empty_not_error() {
    let service = GenerationService::new(
        ScriptedModel::new(vec![Outcome::Ok("Here you go: productName=DreamNest".to_string())]),
        RetryPolicy::default(),
    );

    let brief: Generation<CampaignBrief> = service
        .generate_structured(&CallRequest::text(DEFAULT_TEXT_MODEL, "Analyze"))
        .await
        .unwrap();

    assert_eq!(brief.data, CampaignBrief::default());
    assert_eq!(brief.output_tokens, 20);
    assert_eq!(service.model().attempt_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_structured_call_failure_is_an_error() {
    let service = GenerationService::new(
        ScriptedModel::new(vec![Outcome::Status(429)]),
        RetryPolicy::new(2, Duration::from_millis(10)),
    );

    let error = service
        .generate_structured::<CampaignBrief>(&CallRequest::text(DEFAULT_TEXT_MODEL, "Analyze"))
        .await
        .unwrap_err();

    assert!(error.is_exhausted());
}

#[tokio::test]
async fn test_text_generation_reports_usage() {
    let service = GenerationService::new(
        ScriptedModel::new(vec![Outcome::Ok("Three hooks".to_string())]),
        RetryPolicy::no_retry(),
    );

    let generation = service
        .generate_text(&CallRequest::text(DEFAULT_TEXT_MODEL, "hooks"))
        .await
        .unwrap();

    assert_eq!(generation.data, "Three hooks");
    assert_eq!(generation.usage().input_tokens, 10);
    assert_eq!(generation.usage().output_tokens, 20);
}

#[tokio::test]
async fn test_image_generation_decodes() {
    let service = GenerationService::new(FixedImage, RetryPolicy::default());

    let generation = service
        .generate_image(&CallRequest::text(FLASH_IMAGE_MODEL, "a calm nursery"))
        .await
        .unwrap();

    let image = generation.data.unwrap();
    assert_eq!(image.decode().unwrap(), b"\x89PNG fake");
    assert!(image.to_data_url().starts_with("data:image/png;base64,"));
    assert_eq!(generation.output_tokens, 1290);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_during_backoff() {
    let service = Arc::new(GenerationService::new(
        ScriptedModel::new(vec![Outcome::Status(503)]),
        RetryPolicy::new(5, Duration::from_secs(10)),
    ));
    let token = CancellationToken::new();

    let task = {
        let service = service.clone();
        let token = token.clone();
        tokio::spawn(async move {
            service
                .call_with_retry_cancellable(&CallRequest::text(DEFAULT_TEXT_MODEL, "hi"), &token)
                .await
        })
    };

    tokio::time::sleep(Duration::from_secs(1)).await;
    token.cancel();

    let error = task.await.unwrap().unwrap_err();
    match error {
        RetryError::Cancelled { attempts } => assert_eq!(attempts, 1),
        other => panic!("Expected Cancelled, got {other:?}"),
    }
    assert_eq!(service.model().attempt_count(), 1);
}

#[tokio::test]
async fn test_cancelled_token_prevents_first_attempt() {
    let model = ScriptedModel::new(vec![Outcome::Ok("never".to_string())]);
    let token = CancellationToken::new();
    token.cancel();

    let request = CallRequest::text(DEFAULT_TEXT_MODEL, "hi");
    let error = with_retry_cancellable(RetryPolicy::default(), &token, || {
        model.generate_once(&request)
    })
    .await
    .unwrap_err();

    assert!(error.is_cancelled());
    assert!(error.source_error().is_none());
    assert_eq!(model.attempt_count(), 0);
}
