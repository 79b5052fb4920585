// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Status classification for paginated upstream responses.
//!
//! The policy is a pure function of the response status, the rate-limit
//! reset header and the current Unix time, so it can be exercised without
//! any HTTP machinery. Pagination loops act on the returned [`Verdict`].

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::Error;

const FORBIDDEN: u16 = 403;
const NOT_FOUND: u16 = 404;
const CONFLICT: u16 = 409;
const TOO_MANY_REQUESTS: u16 = 429;

/// Longest wait accepted from a reset header, in seconds.
///
/// GitHub rate-limit windows last one hour.
pub const MAX_RESET_WAIT_SECS: i64 = 3_600;

/// Decision taken for one page response.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub enum Verdict
{
    /// The body can be decoded.
    Proceed,
    /// The resource is unavailable for this call; stop paging it.
    Skip,
    /// The upstream budget is exhausted; wait, then request the same page.
    Wait(Duration,),
}

/// Source of the current Unix time in whole seconds.
pub trait EpochClock: Send + Sync
{
    /// Seconds elapsed since the Unix epoch.
    fn now_epoch(&self,) -> i64;
}

/// Wall-clock implementation of [`EpochClock`].
#[derive(Debug, Clone, Copy, Default,)]
pub struct SystemClock;

impl EpochClock for SystemClock
{
    fn now_epoch(&self,) -> i64
    {
        SystemTime::now()
            .duration_since(UNIX_EPOCH,)
            .map(|elapsed| elapsed.as_secs() as i64,)
            .unwrap_or_default()
    }
}

/// Classifies a response status.
///
/// # Arguments
///
/// * `status` - HTTP status code of the page response
/// * `reset_header` - Raw value of the provider's rate-limit reset header
/// * `now_epoch` - Current Unix time in seconds
/// * `context` - Resource and page description used in error messages
///
/// # Errors
///
/// Returns [`Error::UnexpectedStatus`] for statuses outside the handled set
/// and the errors of [`reset_wait`] for throttled responses.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use repo_activity::rate_limit::{Verdict, classify};
///
/// let verdict = classify(429, Some("1005",), 1000, "commits page 1",)?;
/// assert_eq!(verdict, Verdict::Wait(Duration::from_secs(6,),));
/// # Ok::<(), repo_activity::Error>(())
/// ```
pub fn classify(
    status: u16,
    reset_header: Option<&str,>,
    now_epoch: i64,
    context: &str,
) -> Result<Verdict, Error,>
{
    match status {
        200..=299 => Ok(Verdict::Proceed,),
        FORBIDDEN | NOT_FOUND | CONFLICT => Ok(Verdict::Skip,),
        TOO_MANY_REQUESTS => reset_wait(reset_header, now_epoch, context,).map(Verdict::Wait,),
        other => Err(Error::UnexpectedStatus {
            status: other, context: context.to_string(),
        },),
    }
}

/// Computes how long to wait before retrying a throttled request.
///
/// The wait is `reset - now + 1` seconds; the extra second covers the reset
/// instant itself, which still belongs to the exhausted window. A reset that
/// already passed yields [`Duration::ZERO`].
///
/// # Errors
///
/// Returns [`Error::MissingRateLimitReset`] when the header is absent,
/// [`Error::InvalidRateLimitReset`] when it is not an integer and
/// [`Error::RateLimitResetTooFar`] when the wait exceeds
/// [`MAX_RESET_WAIT_SECS`].
pub fn reset_wait(reset_header: Option<&str,>, now_epoch: i64, context: &str,)
-> Result<Duration, Error,>
{
    let raw = reset_header.ok_or_else(|| Error::MissingRateLimitReset {
        context: context.to_string(),
    },)?;

    let reset_epoch = raw.trim().parse::<i64,>().map_err(|_| Error::InvalidRateLimitReset {
        value:   raw.to_string(),
        context: context.to_string(),
    },)?;

    let wait_seconds = reset_epoch.saturating_sub(now_epoch,).saturating_add(1,);
    if wait_seconds > MAX_RESET_WAIT_SECS {
        return Err(Error::RateLimitResetTooFar {
            context: context.to_string(),
            wait_seconds,
        },);
    }
    if wait_seconds > 0 {
        Ok(Duration::from_secs(wait_seconds as u64,),)
    } else {
        Ok(Duration::ZERO,)
    }
}

#[cfg(test)]
mod tests
{
    use proptest::prelude::*;

    use super::*;

    const NOW: i64 = 1_752_842_096;

    proptest! {
        #[test]
        fn wait_is_reset_distance_plus_one(offset in 0i64..MAX_RESET_WAIT_SECS) {
            let reset = (NOW + offset).to_string();
            let wait = reset_wait(Some(&reset), NOW, "page").expect("valid header");
            prop_assert_eq!(wait, Duration::from_secs((offset + 1) as u64));
        }
    }

    #[test]
    fn success_statuses_proceed()
    {
        for status in [200, 201, 204, 299,] {
            assert_eq!(classify(status, None, NOW, "page",).expect("classified",), Verdict::Proceed);
        }
    }

    #[test]
    fn unavailable_resources_are_skipped()
    {
        for status in [403, 404, 409,] {
            assert_eq!(classify(status, None, NOW, "page",).expect("classified",), Verdict::Skip);
        }
    }

    #[test]
    fn throttled_response_waits_one_second_past_reset()
    {
        let reset = (NOW + 5).to_string();
        let verdict = classify(429, Some(&reset,), NOW, "commits page 2",).expect("classified",);
        assert_eq!(verdict, Verdict::Wait(Duration::from_secs(6,),));
    }

    #[test]
    fn reset_in_the_past_retries_immediately()
    {
        let reset = (NOW - 30).to_string();
        let verdict = classify(429, Some(&reset,), NOW, "page",).expect("classified",);
        assert_eq!(verdict, Verdict::Wait(Duration::ZERO,));

        let reset = (NOW - 1).to_string();
        assert_eq!(reset_wait(Some(&reset,), NOW, "page",).expect("valid",), Duration::ZERO);
    }

    #[test]
    fn reset_beyond_one_window_is_fatal()
    {
        let reset = (NOW + 1_000_000_000_000).to_string();
        let error = classify(429, Some(&reset,), NOW, "commits page 1",).expect_err("expected error",);
        match error {
            Error::RateLimitResetTooFar {
                context,
                wait_seconds,
            } => {
                assert_eq!(context, "commits page 1");
                assert_eq!(wait_seconds, 1_000_000_000_001);
            }
            other => panic!("unexpected error variant: {other:?}"),
        }

        let edge = (NOW + MAX_RESET_WAIT_SECS - 1).to_string();
        assert_eq!(
            reset_wait(Some(&edge,), NOW, "page",).expect("within window",),
            Duration::from_secs(MAX_RESET_WAIT_SECS as u64,)
        );
        let past_edge = (NOW + MAX_RESET_WAIT_SECS).to_string();
        assert!(reset_wait(Some(&past_edge,), NOW, "page",).is_err());
    }

    #[test]
    fn missing_reset_header_is_fatal()
    {
        let error = classify(429, None, NOW, "repos page 3",).expect_err("expected error",);
        match error {
            Error::MissingRateLimitReset {
                context,
            } => assert_eq!(context, "repos page 3"),
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn non_numeric_reset_header_is_fatal()
    {
        let error = classify(429, Some("tomorrow",), NOW, "page",).expect_err("expected error",);
        assert!(matches!(error, Error::InvalidRateLimitReset { ref value, .. } if value == "tomorrow"));
    }

    #[test]
    fn other_statuses_embed_the_code()
    {
        for status in [301, 400, 401, 422, 500, 502,] {
            let error = classify(status, None, NOW, "page",).expect_err("expected error",);
            assert!(matches!(error, Error::UnexpectedStatus { status: code, .. } if code == status));
        }
    }

    #[test]
    fn system_clock_is_past_the_epoch()
    {
        assert!(SystemClock.now_epoch() > NOW - 86_400 * 365);
    }
}
