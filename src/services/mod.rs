pub mod generation;
pub mod google_ai;
pub mod structured;

pub use generation::{batch_usage, Generation, GenerationService};
pub use google_ai::{
    CallRequest, CallResult, ErrorClassification, GenerativeModel, GoogleAiError, InlineData,
    RetryError, RetryPolicy, TokenUsage,
};
#[cfg(feature = "reqwest")]
pub use google_ai::{GoogleAiClient, GoogleAiConfig};
pub use structured::{extract_json_value, extract_structured, strip_code_fences, try_extract_structured};
