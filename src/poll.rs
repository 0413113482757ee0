//! Bounded Polling
//!
//! A single retry primitive shared by every polling component: run a
//! check up to `max_attempts` times with a fixed sleep between
//! attempts, returning a typed `Timeout` error on exhaustion. The
//! check reports a plain observation (`Some`/`None`), never an error -
//! absence of the awaited condition is a normal observed state.

use std::future::Future;
use std::time::Duration;

use crate::error::{Error, Result};

/// Poll `check` up to `max_attempts` times, sleeping `interval`
/// between attempts. Returns the first `Some` observation, or
/// `Error::Timeout` once the attempt budget is exhausted.
///
/// No sleep happens after the final attempt, so a caller observing a
/// match on attempt `k` pays exactly `k` checks and `k - 1` sleeps.
pub async fn retry_bounded<T, F, Fut>(
    what: &str,
    max_attempts: u32,
    interval: Duration,
    mut check: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for attempt in 1..=max_attempts {
        if let Some(value) = check().await {
            tracing::debug!("{} observed on attempt {}/{}", what, attempt, max_attempts);
            return Ok(value);
        }

        tracing::trace!("{}: attempt {}/{} did not match", what, attempt, max_attempts);

        if attempt < max_attempts {
            tokio::time::sleep(interval).await;
        }
    }

    Err(Error::Timeout {
        what: what.to_string(),
        attempts: max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_succeeds_on_kth_attempt() {
        let calls = AtomicU32::new(0);
        let calls = &calls;

        let result = retry_bounded("condition", 10, Duration::from_millis(1), move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            (n == 3).then_some(n)
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_times_out_after_exact_budget() {
        let calls = AtomicU32::new(0);
        let calls = &calls;

        let result: Result<()> =
            retry_bounded("never", 4, Duration::from_millis(1), move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                None
            })
            .await;

        let err = result.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_first_attempt_success_skips_sleep() {
        let start = std::time::Instant::now();

        let result = retry_bounded("immediate", 3, Duration::from_secs(30), || async {
            Some(())
        })
        .await;

        assert!(result.is_ok());
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
