//! Generation service
//!
//! Wraps a [`GenerativeModel`] with a retry policy and turns raw call results
//! into stage results: plain text, fail-soft structured data, images, and
//! index-aligned batches.

use futures::future::join_all;
use serde::de::DeserializeOwned;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use super::google_ai::{
    with_retry, with_retry_cancellable, CallRequest, CallResult, GenerativeModel, InlineData,
    RetryError, RetryPolicy, TokenUsage,
};
use super::structured::extract_structured;
use crate::logging::log_performance;

/// Output of one generation stage together with its token usage.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Generation<T> {
    pub data: T,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl<T> Generation<T> {
    pub fn new(data: T, usage: TokenUsage) -> Self {
        Self {
            data,
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Generation<U> {
        Generation {
            data: f(self.data),
            input_tokens: self.input_tokens,
            output_tokens: self.output_tokens,
        }
    }

    pub fn usage(&self) -> TokenUsage {
        TokenUsage {
            input_tokens: self.input_tokens,
            output_tokens: self.output_tokens,
        }
    }
}

pub struct GenerationService<M> {
    model: M,
    policy: RetryPolicy,
}

impl<M: GenerativeModel> GenerationService<M> {
    pub fn new(model: M, policy: RetryPolicy) -> Self {
        Self { model, policy }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// One logical call: retried per the service policy, fatal errors
    /// returned on first sight.
    pub async fn call_with_retry(&self, request: &CallRequest) -> Result<CallResult, RetryError> {
        let started = Instant::now();
        let result = with_retry(self.policy, || self.model.generate_once(request)).await;
        self.log_outcome(request, started, &result);
        result
    }

    pub async fn call_with_retry_cancellable(
        &self,
        request: &CallRequest,
        token: &CancellationToken,
    ) -> Result<CallResult, RetryError> {
        let started = Instant::now();
        let result =
            with_retry_cancellable(self.policy, token, || self.model.generate_once(request)).await;
        self.log_outcome(request, started, &result);
        result
    }

    pub async fn generate_text(&self, request: &CallRequest) -> Result<Generation<String>, RetryError> {
        let result = self.call_with_retry(request).await?;
        Ok(Generation::new(result.text, result.usage))
    }

    /// Structured output, decoded fail-soft: malformed model output yields
    /// `T::default()`, only call failures are errors.
    pub async fn generate_structured<T>(&self, request: &CallRequest) -> Result<Generation<T>, RetryError>
    where
        T: DeserializeOwned + Default,
    {
        let result = self.call_with_retry(request).await?;
        Ok(Generation::new(extract_structured(&result.text), result.usage))
    }

    /// First inline image of the response, `None` when the model returned
    /// only text.
    pub async fn generate_image(
        &self,
        request: &CallRequest,
    ) -> Result<Generation<Option<InlineData>>, RetryError> {
        let result = self.call_with_retry(request).await?;
        if result.inline_data.is_none() {
            tracing::warn!(model = %request.model, "Image request returned no inline data");
        }
        Ok(Generation::new(result.inline_data, result.usage))
    }

    /// Runs every request concurrently, each with its own retry state.
    /// Results are positional: `results[i]` belongs to `requests[i]`.
    pub async fn generate_batch(
        &self,
        requests: &[CallRequest],
    ) -> Vec<Result<CallResult, RetryError>> {
        join_all(requests.iter().map(|request| self.call_with_retry(request))).await
    }

    fn log_outcome(
        &self,
        request: &CallRequest,
        started: Instant,
        result: &Result<CallResult, RetryError>,
    ) {
        let duration_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(call) => {
                tracing::debug!(
                    provider = self.model.provider_name(),
                    model = %request.model,
                    input_tokens = call.usage.input_tokens,
                    output_tokens = call.usage.output_tokens,
                    "Generation call succeeded"
                );
                log_performance("generate_content", duration_ms, true);
            }
            Err(error) => {
                tracing::error!(
                    provider = self.model.provider_name(),
                    model = %request.model,
                    error = %error,
                    "Generation call failed"
                );
                log_performance("generate_content", duration_ms, false);
            }
        }
    }
}

/// Sums usage over the successful entries of a batch.
pub fn batch_usage(results: &[Result<CallResult, RetryError>]) -> TokenUsage {
    results
        .iter()
        .filter_map(|result| result.as_ref().ok())
        .fold(TokenUsage::default(), |total, call| total + call.usage)
}
