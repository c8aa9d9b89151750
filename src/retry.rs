// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Retry utilities with exponential backoff for API calls.
///
/// Only failures classified as transient by [`Retryable`] are retried; every
/// other failure is returned on the first attempt.
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

/// Configuration for retry behavior with exponential backoff.
#[derive(Debug, Clone, PartialEq,)]
pub struct RetryConfig
{
    /// Maximum number of attempts including the first one (default: 4).
    pub max_attempts:     u32,
    /// Initial delay between retries in milliseconds (default: 1000).
    pub initial_delay_ms: u64,
    /// Multiplier for exponential backoff (default: 2.0).
    pub backoff_factor:   f64,
    /// Upper bound for any single delay in milliseconds (default: 60000).
    pub max_delay_ms:     u64,
}

impl Default for RetryConfig
{
    fn default() -> Self
    {
        Self {
            max_attempts: 4, initial_delay_ms: 1000, backoff_factor: 2.0, max_delay_ms: 60_000,
        }
    }
}

impl RetryConfig
{
    /// Builds a policy performing `retries` additional attempts after the
    /// first one.
    pub fn with_retries(retries: u32,) -> Self
    {
        Self {
            max_attempts: retries.saturating_add(1,), ..Self::default()
        }
    }
}

/// Classification of a failed attempt.
pub trait Retryable
{
    /// Whether another attempt may succeed.
    fn is_transient(&self,) -> bool;

    /// Delay requested by the remote side, such as a `Retry-After` header.
    fn retry_after(&self,) -> Option<Duration,>
    {
        None
    }
}

/// Failure returned by [`retry_with_backoff`].
#[derive(Debug,)]
pub struct RetryError<E,>
{
    /// Last error observed.
    pub error:    E,
    /// Number of attempts performed before giving up.
    pub attempts: u32,
}

/// Executes an async operation with exponential backoff retry logic.
///
/// # Arguments
///
/// * `config` - Retry configuration (max attempts, delays)
/// * `operation_name` - Name of the operation for logging
/// * `f` - Async function to retry
///
/// # Errors
///
/// Returns the first non-transient error immediately, or the last transient
/// error once `max_attempts` is reached, together with the attempt count.
///
/// # Example
///
/// ```no_run
/// use stfd::retry::{RetryConfig, Retryable, retry_with_backoff};
///
/// #[derive(Debug)]
/// struct Flaky;
///
/// impl std::fmt::Display for Flaky {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_,>,) -> std::fmt::Result {
///         f.write_str("flaky upstream",)
///     }
/// }
///
/// impl Retryable for Flaky {
///     fn is_transient(&self,) -> bool { true }
/// }
///
/// # async fn example() {
/// let config = RetryConfig::default();
/// let result = retry_with_backoff(&config, "fetch data", || async { Ok::<_, Flaky,>(42,) },).await;
/// assert_eq!(result.ok(), Some(42));
/// # }
/// ```
pub async fn retry_with_backoff<F, Fut, T, E,>(
    config: &RetryConfig,
    operation_name: &str,
    mut f: F,
) -> Result<T, RetryError<E,>,>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E,>,>,
    E: Retryable + std::fmt::Display,
{
    let mut attempt = 1;
    let mut delay_ms = config.initial_delay_ms;

    loop {
        match f().await {
            Ok(result,) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}", operation_name, attempt);
                }
                return Ok(result,);
            }
            Err(error,) => {
                if !error.is_transient() {
                    return Err(RetryError {
                        error, attempts: attempt,
                    },);
                }

                if attempt >= config.max_attempts {
                    warn!(
                        "{} failed after {} attempts: {}",
                        operation_name, config.max_attempts, error
                    );
                    return Err(RetryError {
                        error, attempts: attempt,
                    },);
                }

                let wait_ms = error
                    .retry_after()
                    .map_or(delay_ms, |after| after.as_millis() as u64,)
                    .min(config.max_delay_ms,);

                warn!(
                    "{} failed on attempt {}/{}: {}. Retrying in {}ms...",
                    operation_name, attempt, config.max_attempts, error, wait_ms
                );

                sleep(Duration::from_millis(wait_ms,),).await;
                delay_ms = (delay_ms as f64 * config.backoff_factor) as u64;
                attempt += 1;
            }
        }
    }
}
