use async_trait::async_trait;
use reqwest::{Client, Response};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use super::errors::GoogleAiError;
use super::models::{CallRequest, CallResult, GenerateContentResponse, DEFAULT_BASE_URL};
use super::traits::GenerativeModel;

#[derive(Debug, Clone)]
pub struct GoogleAiConfig {
    pub api_key: String,
    pub base_url: String,
    /// Per-request transport timeout. Retries are bounded by attempt count,
    /// not by this.
    pub request_timeout: Duration,
    pub max_concurrent_requests: usize,
}

impl Default for GoogleAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(300),
            max_concurrent_requests: 15,
        }
    }
}

impl GoogleAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_max_concurrent_requests(mut self, max: usize) -> Self {
        self.max_concurrent_requests = max;
        self
    }

    pub fn validate(&self) -> Result<(), GoogleAiError> {
        if self.api_key.is_empty() {
            return Err(GoogleAiError::ConfigurationError {
                message: "Google AI API key is required".to_string(),
            });
        }

        if self.base_url.is_empty() {
            return Err(GoogleAiError::ConfigurationError {
                message: "Base URL cannot be empty".to_string(),
            });
        }

        if self.max_concurrent_requests == 0 {
            return Err(GoogleAiError::ConfigurationError {
                message: "At least one concurrent request must be allowed".to_string(),
            });
        }

        Ok(())
    }
}

/// HTTP client for the `generateContent` endpoint. Constructed explicitly and
/// shared by handle; holds no mutable state besides the request semaphore.
#[derive(Clone)]
pub struct GoogleAiClient {
    config: GoogleAiConfig,
    client: Client,
    rate_limiter: Arc<Semaphore>,
}

impl GoogleAiClient {
    pub fn new(config: GoogleAiConfig) -> Result<Self, GoogleAiError> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GoogleAiError::ConfigurationError {
                message: format!("Failed to create HTTP client: {e}"),
            })?;

        let rate_limiter = Arc::new(Semaphore::new(config.max_concurrent_requests));

        Ok(Self {
            config,
            client,
            rate_limiter,
        })
    }

    pub fn config(&self) -> &GoogleAiConfig {
        &self.config
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        )
    }

    async fn handle_response(&self, response: Response) -> Result<CallResult, GoogleAiError> {
        let status = response.status();

        if status.is_success() {
            let response_text = response
                .text()
                .await
                .map_err(GoogleAiError::from_reqwest_error)?;

            let parsed: GenerateContentResponse = serde_json::from_str(&response_text)
                .map_err(|e| GoogleAiError::ParseError {
                    message: format!("Failed to parse response: {e}"),
                })?;

            parsed.into_call_result()
        } else {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            Err(GoogleAiError::from_status_and_body(
                status.as_u16(),
                &error_body,
            ))
        }
    }
}

#[async_trait]
impl GenerativeModel for GoogleAiClient {
    async fn generate_once(&self, request: &CallRequest) -> Result<CallResult, GoogleAiError> {
        request.validate()?;

        let _permit = self
            .rate_limiter
            .acquire()
            .await
            .map_err(|_| GoogleAiError::ConfigurationError {
                message: "Request limiter closed".to_string(),
            })?;

        let url = self.endpoint(&request.model);
        tracing::debug!(model = %request.model, parts = request.parts.len(), "Sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request.to_wire())
            .send()
            .await
            .map_err(GoogleAiError::from_reqwest_error)?;

        self.handle_response(response).await
    }

    fn provider_name(&self) -> &'static str {
        "google-ai"
    }
}
