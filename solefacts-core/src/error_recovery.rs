//! Error recovery strategies for query-time failures.
//!
//! Startup failures (configuration, data loading) always fail fast. Calls to
//! external collaborators may be retried when the error says it is transient.

use crate::{CoreError, ErrorExt, LlmError};
use std::time::Duration;
use tracing::info;

/// Recovery strategy for handling errors
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryStrategy {
    /// Retry the operation with exponential backoff
    RetryWithBackoff {
        max_attempts: usize,
        initial_delay: Duration,
        max_delay: Duration,
    },
    /// Skip the operation and continue
    Skip,
    /// Fail immediately
    Fail,
}

/// Result of an error recovery attempt
#[derive(Debug)]
pub enum RecoveryResult<T> {
    /// The operation succeeded, possibly after retries
    Recovered(T),
    /// The error is permanent for this input; the operation is abandoned
    Skipped(CoreError),
    /// Recovery failed, error should be propagated
    Failed(CoreError),
}

impl<T> RecoveryResult<T> {
    pub fn is_recovered(&self) -> bool {
        matches!(self, RecoveryResult::Recovered(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, RecoveryResult::Skipped(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RecoveryResult::Failed(_))
    }

    /// Converts back into a plain result, surfacing the error that ended the operation.
    pub fn into_result(self) -> Result<T, CoreError> {
        match self {
            RecoveryResult::Recovered(value) => Ok(value),
            RecoveryResult::Skipped(error) | RecoveryResult::Failed(error) => Err(error),
        }
    }
}

/// Error recovery handler that provides strategies for different error types
pub struct ErrorRecovery;

impl ErrorRecovery {
    /// Determine the appropriate recovery strategy for a given error
    pub fn determine_strategy(error: &CoreError) -> RecoveryStrategy {
        match error {
            // Rate limits - honour the provider's wait, but only once more
            CoreError::Llm(LlmError::RateLimitExceeded { retry_after, .. }) => {
                RecoveryStrategy::RetryWithBackoff {
                    max_attempts: 2,
                    initial_delay: Duration::from_secs(*retry_after),
                    max_delay: Duration::from_secs(120),
                }
            }

            CoreError::Llm(e) if e.is_retryable() => RecoveryStrategy::RetryWithBackoff {
                max_attempts: 3,
                initial_delay: Duration::from_secs(1),
                max_delay: Duration::from_secs(30),
            },

            CoreError::Network(_) => RecoveryStrategy::RetryWithBackoff {
                max_attempts: 3,
                initial_delay: Duration::from_secs(1),
                max_delay: Duration::from_secs(30),
            },

            CoreError::Timeout { .. } => RecoveryStrategy::RetryWithBackoff {
                max_attempts: 2,
                initial_delay: Duration::from_secs(5),
                max_delay: Duration::from_secs(10),
            },

            CoreError::RequestFailed { status_code, .. } => match status_code {
                Some(429) => RecoveryStrategy::RetryWithBackoff {
                    max_attempts: 2,
                    initial_delay: Duration::from_secs(60),
                    max_delay: Duration::from_secs(120),
                },
                Some(500..=599) => RecoveryStrategy::RetryWithBackoff {
                    max_attempts: 3,
                    initial_delay: Duration::from_secs(5),
                    max_delay: Duration::from_secs(60),
                },
                _ => RecoveryStrategy::Fail,
            },

            // Blank questions and the like are permanent
            CoreError::InvalidInput { .. } => RecoveryStrategy::Skip,

            _ => RecoveryStrategy::Fail,
        }
    }

    /// Runs `operation` once; on failure, applies the strategy chosen for that error.
    pub async fn run<F, T, Fut>(mut operation: F) -> RecoveryResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>> + Send,
        T: Send,
    {
        match operation().await {
            Ok(value) => RecoveryResult::Recovered(value),
            Err(error) => {
                let strategy = Self::determine_strategy(&error);
                Self::apply_strategy(strategy, error, operation).await
            }
        }
    }

    /// Apply the recovery strategy to an operation whose first attempt failed with `error`.
    /// `max_attempts` counts that first attempt.
    pub async fn apply_strategy<F, T, Fut>(
        strategy: RecoveryStrategy,
        error: CoreError,
        operation: F,
    ) -> RecoveryResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>> + Send,
        T: Send,
    {
        match strategy {
            RecoveryStrategy::Fail => RecoveryResult::Failed(error),
            RecoveryStrategy::Skip => RecoveryResult::Skipped(error),
            RecoveryStrategy::RetryWithBackoff {
                max_attempts,
                initial_delay,
                max_delay,
            } => {
                if max_attempts <= 1 {
                    return RecoveryResult::Failed(error);
                }
                info!(
                    "Retrying after recoverable error: {}",
                    error.user_friendly_message()
                );
                tokio::time::sleep(initial_delay.min(max_delay)).await;
                Self::retry_with_backoff(operation, max_attempts - 1, initial_delay, max_delay)
                    .await
            }
        }
    }

    /// Retry an operation with exponential backoff
    async fn retry_with_backoff<F, T, Fut>(
        mut operation: F,
        max_attempts: usize,
        initial_delay: Duration,
        max_delay: Duration,
    ) -> RecoveryResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>> + Send,
        T: Send,
    {
        let mut attempt = 0;
        let mut delay = initial_delay;

        loop {
            match operation().await {
                Ok(result) => return RecoveryResult::Recovered(result),
                Err(error) => {
                    attempt += 1;

                    if attempt >= max_attempts || !error.is_retryable() {
                        return RecoveryResult::Failed(error);
                    }

                    if let Some(retry_delay) = error.retry_after() {
                        delay = retry_delay;
                    }

                    if delay > max_delay {
                        delay = max_delay;
                    }

                    info!(
                        "Recovery attempt {}/{} failed. Retrying after {:?}: {}",
                        attempt,
                        max_attempts,
                        delay,
                        error.user_friendly_message()
                    );

                    tokio::time::sleep(delay).await;

                    delay = std::cmp::min(delay * 2, max_delay);
                }
            }
        }
    }
}
