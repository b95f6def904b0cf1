//! # Interruptible waits.
//!
//! Helpers that turn a fired [`CancellationToken`] into [`TaskError::Interrupted`],
//! the way a thread blocked in a sleep is woken up by an interrupt.
//!
//! - [`sleep`] for async work;
//! - [`blocking_sleep`] for closures running under [`BlockingTaskFn`](crate::BlockingTaskFn).

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Granularity at which [`blocking_sleep`] re-checks the token.
const BLOCKING_SLICE: Duration = Duration::from_millis(5);

const SLEEP_INTERRUPTED: &str = "sleep interrupted";

/// Sleeps for `dur`, or returns [`TaskError::Interrupted`] as soon as `ctx` is cancelled.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let ctx = CancellationToken::new();
/// ctx.cancel();
/// let err = tasklatch::sleep(&ctx, Duration::from_secs(60)).await.unwrap_err();
/// assert!(err.is_interruption());
/// # }
/// ```
pub async fn sleep(ctx: &CancellationToken, dur: Duration) -> Result<(), TaskError> {
    tokio::select! {
        _ = ctx.cancelled() => Err(TaskError::interrupted(SLEEP_INTERRUPTED)),
        _ = tokio::time::sleep(dur) => Ok(()),
    }
}

/// Blocking counterpart of [`sleep`]: parks the current thread for `dur`, waking up
/// early with [`TaskError::Interrupted`] once `ctx` is cancelled.
///
/// The token is polled every few milliseconds, so interruption is prompt but not instant.
pub fn blocking_sleep(ctx: &CancellationToken, dur: Duration) -> Result<(), TaskError> {
    let deadline = Instant::now() + dur;
    loop {
        if ctx.is_cancelled() {
            return Err(TaskError::interrupted(SLEEP_INTERRUPTED));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(());
        }
        std::thread::sleep((deadline - now).min(BLOCKING_SLICE));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sleep_completes_without_cancellation() {
        let ctx = CancellationToken::new();
        assert!(sleep(&ctx, Duration::from_millis(5)).await.is_ok());
    }

    #[tokio::test]
    async fn sleep_is_woken_by_cancel() {
        let ctx = CancellationToken::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let started = Instant::now();
        let res = sleep(&ctx, Duration::from_secs(10)).await;
        assert_eq!(res, Err(TaskError::interrupted("sleep interrupted")));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn blocking_sleep_is_woken_by_cancel() {
        let ctx = CancellationToken::new();
        let canceller = ctx.clone();
        let t = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            canceller.cancel();
        });

        let started = Instant::now();
        let res = blocking_sleep(&ctx, Duration::from_secs(10));
        t.join().unwrap();
        assert!(res.unwrap_err().is_interruption());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn blocking_sleep_runs_to_deadline() {
        let ctx = CancellationToken::new();
        let started = Instant::now();
        assert!(blocking_sleep(&ctx, Duration::from_millis(15)).is_ok());
        assert!(started.elapsed() >= Duration::from_millis(15));
    }
}
