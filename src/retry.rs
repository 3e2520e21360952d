//! Retry policy for source fetches.
//!
//! [`RetryFetch`] wraps any [`FetchPosts`] implementation and applies a
//! [`RetryPolicy`]: a maximum number of attempts, a linear backoff and a
//! predicate deciding which errors are worth another attempt.
//!
//! # Retry Strategy
//!
//! - 3 attempts by default
//! - Linear backoff: attempt `i` (zero-based) waits `step * i` before it runs
//! - With the default 2 s step the waits are 0, 2 s, 4 s
//!
//! Exhaustion is not an error: the caller receives `None` and decides
//! whether the run can continue.

use crate::config::RetrySettings;
use crate::fetcher::{FetchError, FetchPosts};
use crate::models::{RawEntry, SourceConfig};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// How many times a source fetch is attempted and how long to wait between
/// attempts.
///
/// # Fields
///
/// * `max_attempts` - Total attempts, including the first
/// * `backoff_step` - Delay unit; attempt `i` waits `backoff_step * i`
/// * `retryable` - Errors for which this returns `false` end the loop early
#[derive(Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub backoff_step: Duration,
    pub retryable: fn(&FetchError) -> bool,
}

impl RetryPolicy {
    /// Create a policy that retries every error [`FetchError::is_retryable`]
    /// accepts.
    ///
    /// # Arguments
    ///
    /// * `max_attempts` - Total attempts, including the first
    /// * `backoff_step` - Linear backoff unit
    pub fn new(max_attempts: usize, backoff_step: Duration) -> Self {
        Self {
            max_attempts,
            backoff_step,
            retryable: FetchError::is_retryable,
        }
    }

    /// Delay inserted before the zero-based `attempt`.
    ///
    /// # Returns
    ///
    /// `Duration::ZERO` for the first attempt, then `backoff_step * attempt`.
    pub fn delay_before(&self, attempt: usize) -> Duration {
        self.backoff_step.saturating_mul(attempt as u32)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self::new(settings.max_attempts, Duration::from_millis(settings.backoff_step_ms))
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("backoff_step", &self.backoff_step)
            .finish()
    }
}

/// Wrapper that adds the retry policy to any [`FetchPosts`] implementation.
pub struct RetryFetch<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T> RetryFetch<T>
where
    T: FetchPosts,
{
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Fetch a source, retrying per the policy.
    ///
    /// Returns `None` once every attempt has failed or an error the policy
    /// does not retry is hit. Intermediate failures are logged at `warn`,
    /// the final one at `error`.
    #[instrument(level = "info", skip_all, fields(source = %source.slug))]
    pub async fn fetch(&self, source: &SourceConfig) -> Option<Vec<RawEntry>> {
        let total_t0 = Instant::now();

        for attempt in 0..self.policy.max_attempts {
            if attempt > 0 {
                let delay = self.policy.delay_before(attempt);
                sleep(delay).await;
            }

            match self.inner.fetch(source, attempt).await {
                Ok(entries) => {
                    if attempt > 0 {
                        info!(attempt = attempt + 1, "Fetch succeeded after retry");
                    }
                    return Some(entries);
                }
                Err(e) => {
                    let last = attempt + 1 == self.policy.max_attempts;
                    if last || !(self.policy.retryable)(&e) {
                        error!(
                            attempt = attempt + 1,
                            max = self.policy.max_attempts,
                            elapsed_ms_total = total_t0.elapsed().as_millis(),
                            error = %e,
                            "Fetch failed; giving up"
                        );
                        return None;
                    }
                    warn!(
                        attempt = attempt + 1,
                        max = self.policy.max_attempts,
                        next_delay = ?self.policy.delay_before(attempt + 1),
                        error = %e,
                        "Fetch attempt failed; retrying"
                    );
                }
            }
        }
        None
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch").field("policy", &self.policy).finish()
    }
}
