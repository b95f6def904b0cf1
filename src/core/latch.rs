//! # Terminal-state latch.
//!
//! One `AtomicU8` holds the task's [`TaskState`]. The only transitions are
//! `Pending → Succeeded | Failed | Cancelled`, each performed by a single
//! `compare_exchange`. Whichever of {completion, cancellation} wins that CAS decides
//! where the task's result is delivered.
//!
//! A separate flag records that cancellation was *requested*, so `is_cancelled()`
//! stays true even when completion won the race first.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Observable state of a submitted task.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// Neither completion nor cancellation has won yet.
    Pending = 0,
    /// Work succeeded before cancellation.
    Succeeded = 1,
    /// Work failed before cancellation.
    Failed = 2,
    /// Cancellation won; callbacks were disposed.
    Cancelled = 3,
}

impl TaskState {
    #[inline]
    fn as_u8(self) -> u8 {
        self as u8
    }

    #[inline]
    fn from_u8(v: u8) -> Self {
        match v {
            0 => TaskState::Pending,
            1 => TaskState::Succeeded,
            2 => TaskState::Failed,
            _ => TaskState::Cancelled,
        }
    }

    /// Returns `true` for `Succeeded`, `Failed` and `Cancelled`.
    #[inline]
    pub fn is_terminal(self) -> bool {
        !matches!(self, TaskState::Pending)
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::Succeeded => "succeeded",
            TaskState::Failed => "failed",
            TaskState::Cancelled => "cancelled",
        }
    }
}

pub(crate) struct Latch {
    state: AtomicU8,
    cancel_requested: AtomicBool,
}

impl Latch {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(TaskState::Pending.as_u8()),
            cancel_requested: AtomicBool::new(false),
        }
    }

    pub(crate) fn state(&self) -> TaskState {
        TaskState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Attempts `Pending → to`. On failure returns the state that won.
    pub(crate) fn try_finish(&self, to: TaskState) -> Result<(), TaskState> {
        debug_assert!(to.is_terminal());
        self.state
            .compare_exchange(
                TaskState::Pending.as_u8(),
                to.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| ())
            .map_err(TaskState::from_u8)
    }

    /// Raises the cancellation flag and races for `Cancelled`.
    ///
    /// Returns `true` only for the call that moved the latch.
    pub(crate) fn request_cancel(&self) -> bool {
        self.cancel_requested.store(true, Ordering::Release);
        self.try_finish(TaskState::Cancelled).is_ok()
    }

    pub(crate) fn is_cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::Acquire)
    }
}
