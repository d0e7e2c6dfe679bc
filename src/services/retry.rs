use std::future::Future;
use std::time::Duration;

use tracing::{error, warn};

use crate::cancel::CancelSignal;
use crate::config::{DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_BACKOFF_MS};
use crate::error::CurriculumError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `step × attempt`
    Linear(Duration),
    Fixed(Duration),
    None,
}

impl Backoff {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Linear(step) => step.saturating_mul(attempt),
            Backoff::Fixed(delay) => delay,
            Backoff::None => Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_RETRY_ATTEMPTS,
            Backoff::Linear(Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS)),
        )
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn no_retry() -> Self {
        Self::new(1, Backoff::None)
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff.delay_for(attempt)
    }
}

/// Runs `op` until it stops reporting [`CurriculumError::Conflict`].
///
/// The closure receives the 1-based attempt number and must redo its whole
/// read-modify-write cycle. Any other error is returned as-is. Running out
/// of attempts yields [`CurriculumError::OperationFailed`]; a fired
/// `cancel` yields [`CurriculumError::Cancelled`] and abandons the rest.
pub async fn retry_on_conflict<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancelSignal,
    operation: &'static str,
    mut op: F,
) -> Result<T, CurriculumError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, CurriculumError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        if cancel.is_cancelled() {
            return Err(CurriculumError::Cancelled);
        }

        match op(attempt).await {
            Err(err) if err.is_conflict() => {
                if attempt >= max_attempts {
                    error!(operation, attempts = attempt, error = %err, "retries exhausted");
                    return Err(CurriculumError::OperationFailed {
                        operation,
                        attempts: attempt,
                    });
                }

                let delay = policy.delay_for(attempt);
                warn!(
                    operation,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "concurrent update detected, retrying"
                );
                cancel.sleep(delay).await?;
                attempt += 1;
            }
            other => return other,
        }
    }
}
