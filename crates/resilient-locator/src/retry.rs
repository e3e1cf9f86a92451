// Retry controller
//
// `retry_interaction` runs one logical interaction up to `max_retries` times,
// retrying only ElementNotFound / ElementNotInteractable and sleeping on a
// doubling schedule between attempts. Anything else aborts immediately. On
// exhaustion the last error is returned unchanged.
//
// `retry_with_backoff` is the general-purpose variant: caller-supplied
// retryability predicate, any error type, and whatever Backoff (jittered or
// not) the caller injects.

use crate::backoff::Backoff;
use crate::error::{Error, Result};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Attempt budget and delay schedule for interaction retries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff: Backoff,
}

impl RetryPolicy {
    /// Doubling policy from an attempt count and initial delay in seconds.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` if `max_retries < 1` or
    /// `initial_delay_secs < 0`.
    pub fn new(max_retries: u32, initial_delay_secs: f64) -> Result<Self> {
        Self::with_backoff(max_retries, Backoff::from_secs_f64(initial_delay_secs)?)
    }

    /// Policy with an explicit backoff schedule
    pub fn with_backoff(max_retries: u32, backoff: Backoff) -> Result<Self> {
        if max_retries < 1 {
            return Err(Error::InvalidArgument(format!(
                "max_retries must be >= 1, got {}",
                max_retries
            )));
        }
        Ok(Self {
            max_retries,
            backoff,
        })
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }
}

/// Retries an interaction on ElementNotFound / ElementNotInteractable.
pub async fn retry_interaction<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut interaction: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    run(
        policy.backoff(),
        policy.max_retries(),
        operation,
        Error::is_retryable,
        &mut interaction,
    )
    .await
}

/// General-purpose retry with an injected backoff and retry predicate.
///
/// `max_attempts` of zero is treated as one attempt.
pub async fn retry_with_backoff<T, E, F, Fut, P>(
    backoff: &Backoff,
    max_attempts: u32,
    should_retry: P,
    mut operation: F,
) -> std::result::Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    P: Fn(&E) -> bool,
{
    run(
        backoff,
        max_attempts.max(1),
        "operation",
        should_retry,
        &mut operation,
    )
    .await
}

async fn run<T, E, F, Fut, P>(
    backoff: &Backoff,
    max_attempts: u32,
    operation: &str,
    should_retry: P,
    attempt_fn: &mut F,
) -> std::result::Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        let err = match attempt_fn().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!(operation, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !should_retry(&err) {
            tracing::debug!(operation, attempt, error = %err, "Non-retryable failure");
            return Err(err);
        }

        if attempt >= max_attempts {
            tracing::warn!(
                operation,
                attempts = attempt,
                error = %err,
                "Retries exhausted"
            );
            return Err(err);
        }

        let delay = backoff.delay(attempt - 1);
        tracing::warn!(
            operation,
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Attempt failed, retrying"
        );
        sleep(delay).await;
    }
}

async fn sleep(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
