//! Model client trait definition
//!
//! The retry wrapper and generation service only talk to this trait, so the
//! HTTP client can be swapped for a fake in tests.

use async_trait::async_trait;

use super::errors::GoogleAiError;
use super::models::{CallRequest, CallResult};

/// A single, un-retried attempt at one generation call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Issue one request. Implementations must build a fresh request body on
    /// every invocation.
    async fn generate_once(&self, request: &CallRequest) -> Result<CallResult, GoogleAiError>;

    /// Provider name for logging
    fn provider_name(&self) -> &'static str;
}

#[async_trait]
impl<M: GenerativeModel + ?Sized> GenerativeModel for std::sync::Arc<M> {
    async fn generate_once(&self, request: &CallRequest) -> Result<CallResult, GoogleAiError> {
        (**self).generate_once(request).await
    }

    fn provider_name(&self) -> &'static str {
        (**self).provider_name()
    }
}
