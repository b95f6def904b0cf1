//! # Runtime events emitted by the runner and its workers.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Lifecycle events**: task flow (submitted, starting, succeeded, failed, cancelled)
//! - **Delivery events**: where a result ended up when cancellation won the race
//! - **Isolation events**: panics caught in callbacks, sinks and subscribers
//! - **Shutdown events**: runner teardown
//!
//! The [`Event`] struct carries additional metadata such as timestamps, task id/name
//! and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use tasklatch::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::OrphanDropped)
//!     .with_task("sleeper")
//!     .with_task_id(7)
//!     .with_reason("interrupted: sleep interrupted");
//!
//! assert_eq!(ev.kind, EventKind::OrphanDropped);
//! assert_eq!(ev.task.as_deref(), Some("sleeper"));
//! assert_eq!(ev.task_id, Some(7));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
///
/// Incremented with `AcqRel`: an event with a larger `seq` happens-after every event with
/// a smaller one, so state changed before publishing is visible after it.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Shutdown events ===
    /// [`Runner::shutdown`](crate::Runner::shutdown) was called.
    ShutdownRequested,

    /// All tasks settled within the configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; stuck workers were aborted.
    ///
    /// Sets:
    /// - `reason`: names of the stuck tasks
    GraceExceeded,

    // === Task lifecycle events ===
    /// Task accepted by the runner.
    ///
    /// Sets: `task`, `task_id`, `timeout_ms` (when a timeout is armed)
    TaskSubmitted,

    /// Task work is about to be invoked.
    ///
    /// Sets: `task`, `task_id`
    TaskStarting,

    /// Task was cancelled before its work started; the work is never invoked.
    ///
    /// Sets: `task`, `task_id`
    TaskSkipped,

    /// Work succeeded and won the terminal-state race.
    ///
    /// Sets: `task`, `task_id`
    TaskSucceeded,

    /// Work failed and won the terminal-state race; the error goes to `on_error`.
    ///
    /// Sets: `task`, `task_id`, `reason`
    TaskFailed,

    /// Cancellation won the terminal-state race.
    ///
    /// Sets: `task`, `task_id`
    TaskCancelled,

    /// The task's timeout fired and cancelled it.
    ///
    /// Sets: `task`, `task_id`, `timeout_ms`
    TimeoutHit,

    // === Delivery after cancellation ===
    /// Work succeeded after cancellation won; the success is discarded.
    ///
    /// Sets: `task`, `task_id`
    SuccessDiscarded,

    /// Orphaned error handed to the fallback sink.
    ///
    /// Sets: `task`, `task_id`, `reason`
    OrphanDelivered,

    /// Orphaned error dropped because no fallback sink is configured.
    ///
    /// Sets: `task`, `task_id`, `reason`
    OrphanDropped,

    // === Isolation ===
    /// A user `on_success`/`on_error` callback panicked.
    ///
    /// Sets: `task`, `task_id`, `reason`
    CallbackPanicked,

    /// The fallback sink panicked while handling an orphaned error.
    ///
    /// Sets: `task`, `task_id`, `reason`
    SinkPanicked,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,

    /// Task timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Id of the task, if applicable.
    pub task_id: Option<u64>,
    /// Name of the task (or subscriber), if applicable.
    pub task: Option<Arc<str>>,
    /// Event classification.
    pub kind: EventKind,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::AcqRel),
            kind,
            at: SystemTime::now(),
            timeout_ms: None,
            reason: None,
            task_id: None,
            task: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a task id.
    #[inline]
    pub fn with_task_id(mut self, id: u64) -> Self {
        self.task_id = Some(id);
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}
