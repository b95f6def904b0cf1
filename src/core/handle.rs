//! # Caller-side handle to a submitted task.

use std::fmt;
use std::sync::Arc;

use crate::core::latch::TaskState;
use crate::core::slot::{Callbacks, TaskId, TaskSlot};
use crate::error::{SubscribeError, TaskError};

/// Handle returned by [`Runner::submit`](crate::Runner::submit).
///
/// Cheap to clone; every clone controls the same task. Dropping all handles does **not**
/// cancel the task.
///
/// ## Delivery contract
/// A task's result reaches exactly one consumer:
/// - the callbacks registered with [`subscribe`](Self::subscribe), if the work finished
///   before [`cancel`](Self::cancel) won the race;
/// - otherwise the runner's [`FallbackSink`](crate::FallbackSink) (errors only; a late
///   success is discarded).
#[derive(Clone)]
pub struct TaskHandle {
    slot: Arc<TaskSlot>,
}

impl TaskHandle {
    pub(crate) fn new(slot: Arc<TaskSlot>) -> Self {
        Self { slot }
    }

    /// Id assigned at submission.
    pub fn id(&self) -> TaskId {
        self.slot.id()
    }

    /// Task name.
    pub fn name(&self) -> &str {
        self.slot.name()
    }

    /// Requests cancellation.
    ///
    /// Idempotent and safe to call from any thread. Returns `true` only for the call
    /// that actually cancelled the task; `false` if it was already cancelled or its
    /// result had already been captured.
    ///
    /// When this call wins, registered callbacks are dropped without being invoked and
    /// the task's `CancellationToken` fires to interrupt blocking work.
    pub fn cancel(&self) -> bool {
        self.slot.cancel()
    }

    /// Returns `true` once cancellation has been requested (even if it lost the race).
    pub fn is_cancelled(&self) -> bool {
        self.slot.is_cancelled()
    }

    /// Current state of the terminal-state latch.
    pub fn state(&self) -> TaskState {
        self.slot.state()
    }

    /// Registers the completion callbacks.
    ///
    /// At most one of them is invoked, at most once, and only if the work finished before
    /// cancellation. If the result is already available the matching callback runs on the
    /// calling thread before this returns; otherwise it runs on the worker. If the task is
    /// already cancelled, both callbacks are dropped unused.
    ///
    /// # Errors
    /// [`SubscribeError::AlreadySubscribed`] if callbacks were registered before; the new
    /// callbacks are dropped.
    pub fn subscribe<S, E>(&self, on_success: S, on_error: E) -> Result<(), SubscribeError>
    where
        S: FnOnce() + Send + 'static,
        E: FnOnce(TaskError) + Send + 'static,
    {
        self.slot.subscribe(Callbacks::new(on_success, on_error))
    }

    /// Waits until the task reaches a terminal state.
    ///
    /// `Cancelled` is returned as soon as cancellation wins; the work may still be running.
    /// Use [`settled`](Self::settled) to wait for the worker as well.
    pub async fn wait(&self) -> TaskState {
        self.slot.wait_terminal().await
    }

    /// Waits until the worker has exited and the result has been routed
    /// (callback invoked, sink invoked, or result dropped).
    pub async fn settled(&self) {
        self.slot.wait_exited().await
    }

    /// Returns `true` once the worker has exited.
    pub fn is_settled(&self) -> bool {
        self.slot.has_exited()
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("state", &self.state())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
