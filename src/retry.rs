// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Retry accounting for throttled page requests.
///
/// Provides a bounded counter of consecutive rate-limit retries for one page
/// and a sleep that can be interrupted through a cancellation token.
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::Error;

/// Default cap on consecutive rate-limit retries for a single page.
pub const DEFAULT_MAX_RATE_LIMIT_RETRIES: u32 = 5;

/// Tracks consecutive rate-limit retries for the page currently requested.
#[derive(Debug, Clone,)]
pub struct RetryBudget
{
    max_attempts: u32,
    attempts:     u32,
}

impl RetryBudget
{
    /// Creates a budget allowing `max_attempts` consecutive retries per page.
    pub fn new(max_attempts: u32,) -> Self
    {
        Self {
            max_attempts, attempts: 0,
        }
    }

    /// Records one more retry of the current page.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RateLimitRetriesExhausted`] once the cap is exceeded.
    pub fn consume(&mut self, context: &str,) -> Result<u32, Error,>
    {
        if self.attempts >= self.max_attempts {
            warn!("{} still throttled after {} retries", context, self.attempts);
            return Err(Error::RateLimitRetriesExhausted {
                context: context.to_string(), attempts: self.attempts,
            },);
        }
        self.attempts += 1;
        Ok(self.attempts,)
    }

    /// Clears the counter once the page advances.
    pub fn reset(&mut self,)
    {
        self.attempts = 0;
    }

    /// Number of retries spent on the current page.
    pub fn attempts(&self,) -> u32
    {
        self.attempts
    }
}

impl Default for RetryBudget
{
    fn default() -> Self
    {
        Self::new(DEFAULT_MAX_RATE_LIMIT_RETRIES,)
    }
}

/// Suspends the current task until the rate-limit window resets.
///
/// A zero duration returns immediately. Cancellation wins over the sleep and
/// is reported, never swallowed.
///
/// # Errors
///
/// Returns [`Error::Cancelled`] when `cancel` fires before the wait elapses
/// or was already cancelled.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
///
/// use repo_activity::retry::wait_for_reset;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), repo_activity::Error> {
/// let cancel = CancellationToken::new();
/// wait_for_reset(Duration::from_secs(6,), &cancel, "commits page 2",).await?;
/// # Ok(())
/// # }
/// ```
pub async fn wait_for_reset(
    wait: Duration,
    cancel: &CancellationToken,
    context: &str,
) -> Result<(), Error,>
{
    if cancel.is_cancelled() {
        return Err(Error::Cancelled {
            context: context.to_string(),
        },);
    }
    if wait.is_zero() {
        debug!("Rate limit for {} already reset, retrying now", context);
        return Ok((),);
    }

    warn!("Rate limited during {}: sleeping {}s", context, wait.as_secs());

    tokio::select! {
        _ = cancel.cancelled() => Err(Error::Cancelled {
            context: context.to_string(),
        },),
        _ = sleep(wait,) => Ok((),),
    }
}
