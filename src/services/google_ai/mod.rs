#[cfg(feature = "reqwest")]
pub mod client;
pub mod errors;
pub mod models;
pub mod retry;
pub mod traits;

#[cfg(feature = "reqwest")]
pub use client::{GoogleAiClient, GoogleAiConfig};
pub use errors::{ErrorClassification, GoogleAiError, RetryError};
pub use models::{
    CallRequest, CallResult, Candidate, Content, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig, ImageConfig, ImageModel, InlineData, Part, PromptFeedback, TokenUsage,
    UsageMetadata, DEFAULT_BASE_URL, DEFAULT_TEXT_MODEL, FLASH_IMAGE_MODEL, PRO_IMAGE_MODEL,
};
pub use retry::{with_retry, with_retry_cancellable, RetryHandler, RetryPolicy};
pub use traits::GenerativeModel;
