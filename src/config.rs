//! # Runner configuration.
//!
//! Provides [`RunnerConfig`] centralized settings for the task runner.
//!
//! ## Sentinel values
//! - `max_concurrent = 0` → unlimited (no semaphore created)
//! - `timeout = 0s` → no default timeout
//! - `grace = 0s` → shutdown does not wait; stuck workers are aborted immediately

use std::time::Duration;

/// Configuration for a [`Runner`](crate::Runner).
///
/// ## Field semantics
/// - `grace`: Maximum wait for tasks to settle on shutdown
/// - `max_concurrent`: Number of tasks whose work may run at the same time (`0` = unlimited)
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by Bus)
/// - `timeout`: Default per-task timeout, implemented as a delayed `cancel()` (`0s` = none)
///
/// ## Notes
/// All fields are public. Prefer the helper accessors to avoid sprinkling
/// sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct RunnerConfig {
    /// Maximum time [`Runner::shutdown`](crate::Runner::shutdown) waits for
    /// cancelled tasks to settle before aborting them.
    pub grace: Duration,

    /// Maximum number of tasks running their work concurrently.
    ///
    /// - `0` = unlimited (no semaphore)
    /// - `n > 0` = at most `n` tasks run; the rest wait for a permit
    ///
    /// A task cancelled while waiting for a permit never runs.
    pub max_concurrent: usize,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,

    /// Default task timeout.
    ///
    /// - `Duration::ZERO` = no timeout
    /// - `> 0` = the task is cancelled once this much time passed since its work started
    ///
    /// Overridden per task by [`Runner::submit_with_timeout`](crate::Runner::submit_with_timeout).
    pub timeout: Duration,
}

impl RunnerConfig {
    /// Returns the concurrency limit as an `Option`.
    ///
    /// - `None` → unlimited (no semaphore)
    /// - `Some(n)` → at most `n` concurrent tasks
    #[inline]
    pub fn concurrency_limit(&self) -> Option<usize> {
        if self.max_concurrent == 0 {
            None
        } else {
            Some(self.max_concurrent)
        }
    }

    /// Returns the default per-task timeout as an `Option`.
    #[inline]
    pub fn default_timeout(&self) -> Option<Duration> {
        if self.timeout == Duration::ZERO {
            None
        } else {
            Some(self.timeout)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for RunnerConfig {
    /// Default configuration:
    ///
    /// - `grace = 60s`
    /// - `max_concurrent = 0` (unlimited)
    /// - `bus_capacity = 1024`
    /// - `timeout = 0s` (no timeout)
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(60),
            max_concurrent: 0,
            bus_capacity: 1024,
            timeout: Duration::from_secs(0),
        }
    }
}
