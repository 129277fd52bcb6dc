use backoff::{backoff::Backoff, ExponentialBackoff};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::errors::{ErrorClassification, GoogleAiError, RetryError};

/// Attempt budget and backoff base for one logical call.
///
/// The wait before retry `k` (0-indexed) is `base_delay * 2^k`. There is no
/// jitter and no overall deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// A single attempt, never sleeps.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn validate(&self) -> Result<(), GoogleAiError> {
        if self.max_attempts == 0 {
            return Err(GoogleAiError::ConfigurationError {
                message: "Retry policy needs at least one attempt".to_string(),
            });
        }
        Ok(())
    }

    /// Deterministic doubling schedule starting at `base_delay`.
    pub fn backoff(&self) -> ExponentialBackoff {
        let mut backoff = ExponentialBackoff {
            initial_interval: self.base_delay,
            randomization_factor: 0.0,
            multiplier: 2.0,
            max_interval: Duration::MAX,
            max_elapsed_time: None,
            ..Default::default()
        };
        backoff.reset();
        backoff
    }

    /// The waits this policy would perform if every attempt failed retryably.
    pub fn delays(&self) -> Vec<Duration> {
        let mut backoff = self.backoff();
        (1..self.max_attempts)
            .map_while(|_| backoff.next_backoff())
            .collect()
    }
}

/// Retry state for one logical call. Not shared between calls.
pub struct RetryHandler {
    policy: RetryPolicy,
    backoff: ExponentialBackoff,
    attempts: u32,
}

impl RetryHandler {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            backoff: policy.backoff(),
            policy,
            attempts: 0,
        }
    }

    pub async fn retry<F, Fut, T>(&mut self, operation: F) -> Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GoogleAiError>>,
    {
        self.run(None, operation).await
    }

    /// Like [`RetryHandler::retry`], but stops at the next suspension point
    /// once `token` is cancelled.
    pub async fn retry_cancellable<F, Fut, T>(
        &mut self,
        token: &CancellationToken,
        operation: F,
    ) -> Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GoogleAiError>>,
    {
        self.run(Some(token), operation).await
    }

    async fn run<F, Fut, T>(
        &mut self,
        token: Option<&CancellationToken>,
        mut operation: F,
    ) -> Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GoogleAiError>>,
    {
        loop {
            if token.is_some_and(|t| t.is_cancelled()) {
                return Err(RetryError::Cancelled {
                    attempts: self.attempts,
                });
            }

            self.attempts += 1;

            let outcome = match token {
                Some(token) => tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        return Err(RetryError::Cancelled { attempts: self.attempts });
                    }
                    outcome = operation() => outcome,
                },
                None => operation().await,
            };

            let error = match outcome {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if error.classify() == ErrorClassification::Fatal {
                tracing::debug!(
                    attempt = self.attempts,
                    error = %error,
                    "Call failed with non-retryable error"
                );
                return Err(RetryError::Fatal { source: error });
            }

            if self.attempts >= self.policy.max_attempts {
                return Err(RetryError::ExhaustedRetries {
                    attempts: self.attempts,
                    last_error: error,
                });
            }

            let Some(delay) = self.backoff.next_backoff() else {
                return Err(RetryError::ExhaustedRetries {
                    attempts: self.attempts,
                    last_error: error,
                });
            };

            tracing::warn!(
                attempt = self.attempts,
                max_attempts = self.policy.max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "API call failed, retrying"
            );

            match token {
                Some(token) => tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        return Err(RetryError::Cancelled { attempts: self.attempts });
                    }
                    _ = tokio::time::sleep(delay) => {}
                },
                None => tokio::time::sleep(delay).await,
            }
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
        self.backoff.reset();
    }
}

pub async fn with_retry<F, Fut, T>(policy: RetryPolicy, operation: F) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GoogleAiError>>,
{
    RetryHandler::new(policy).retry(operation).await
}

pub async fn with_retry_cancellable<F, Fut, T>(
    policy: RetryPolicy,
    token: &CancellationToken,
    operation: F,
) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GoogleAiError>>,
{
    RetryHandler::new(policy)
        .retry_cancellable(token, operation)
        .await
}
