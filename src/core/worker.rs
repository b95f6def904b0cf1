//! # Execute one submitted task and route its result.
//!
//! - **Wait for a permit** if the runner caps concurrency (cancellable wait)
//! - **Skip** the work entirely if cancellation won before it started
//! - **Run the work** with panic isolation and an optional timeout
//! - **Race the result** against cancellation and deliver it to exactly one consumer
//!
//! ## Event flow
//!
//! ```text
//! Cancelled before start:
//!   (permit wait / latch check) → publish TaskSkipped            (work never invoked)
//!   TaskStarting → latch re-check → publish TaskSkipped          (work never invoked)
//!
//! Completion wins:
//!   TaskStarting → work → Ok/Err → latch Succeeded/Failed → publish TaskSucceeded/TaskFailed
//!                                                          → on_success / on_error
//!
//! Cancellation wins:
//!   TaskStarting → cancel() → TaskCancelled → work → Err → publish OrphanDelivered/OrphanDropped
//!                                                 → Ok  → publish SuccessDiscarded
//!
//! Timeout:
//!   TaskStarting → timer fires → cancel() → publish TimeoutHit → (as "cancellation wins")
//! ```
//!
//! ## Rules
//! - Work errors and panics never escape the worker
//! - The timeout is a delayed `cancel()`; the worker keeps awaiting the work afterwards
//!   so its late result is still routed
//! - The exit guard deregisters the task and marks it settled even if the worker is aborted
//! - A cancel that wins after the last latch check reaches the work only through its token

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time;

use crate::core::latch::TaskState;
use crate::core::registry::Registry;
use crate::core::slot::{Completion, TaskSlot};
use crate::error::TaskError;
use crate::events::EventKind;
use crate::fallback::{FallbackSink, OrphanedError, SinkDelivery};
use crate::tasks::TaskRef;

/// Everything a worker needs to execute one task.
pub(crate) struct Worker {
    pub(crate) slot: Arc<TaskSlot>,
    pub(crate) task: TaskRef,
    /// Never `Some(Duration::ZERO)`; the runner filters it out.
    pub(crate) timeout: Option<Duration>,
    pub(crate) semaphore: Option<Arc<Semaphore>>,
    pub(crate) fallback: Arc<FallbackSink>,
    pub(crate) registry: Arc<Registry>,
}

/// Deregisters the task and flags it as settled when the worker ends, however it ends.
struct ExitGuard {
    slot: Arc<TaskSlot>,
    registry: Arc<Registry>,
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.registry.remove(self.slot.id());
        self.slot.mark_exited();
    }
}

impl Worker {
    /// Runs the task to completion and routes its result.
    pub(crate) async fn run(self) {
        let _guard = ExitGuard {
            slot: Arc::clone(&self.slot),
            registry: Arc::clone(&self.registry),
        };

        let Some(_permit) = self.acquire().await else {
            self.skip();
            return;
        };
        if self.slot.state() == TaskState::Cancelled {
            self.skip();
            return;
        }

        self.slot.publish(self.slot.event(EventKind::TaskStarting));
        // A cancel that won while `TaskStarting` was being published still skips the work.
        if self.slot.state() == TaskState::Cancelled {
            self.skip();
            return;
        }
        let result = self.execute().await;

        match self.slot.complete(result) {
            Completion::Delivered => {}
            Completion::Orphaned(Ok(())) => {
                self.slot
                    .publish(self.slot.event(EventKind::SuccessDiscarded));
            }
            Completion::Orphaned(Err(error)) => self.orphan(error),
        }
    }

    /// Waits for a concurrency permit. `None` means the task was cancelled while queued.
    ///
    /// The outer `Option` is "may run"; the inner one is "holds a permit".
    async fn acquire(&self) -> Option<Option<OwnedSemaphorePermit>> {
        let Some(sem) = &self.semaphore else {
            return Some(None);
        };
        tokio::select! {
            permit = Arc::clone(sem).acquire_owned() => permit.ok().map(Some),
            _ = self.slot.token().cancelled() => None,
        }
    }

    /// Invokes the work, catching panics and arming the timeout.
    async fn execute(&self) -> Result<(), TaskError> {
        let work = AssertUnwindSafe(self.task.spawn(self.slot.token().clone())).catch_unwind();
        tokio::pin!(work);

        let caught = match self.timeout {
            Some(dur) => {
                tokio::select! {
                    res = &mut work => res,
                    _ = time::sleep(dur) => {
                        if self.slot.cancel() {
                            self.slot
                                .publish(self.slot.event(EventKind::TimeoutHit).with_timeout(dur));
                        }
                        work.await
                    }
                }
            }
            None => work.await,
        };
        caught.unwrap_or_else(|payload| Err(TaskError::from_panic(&*payload)))
    }

    fn skip(&self) {
        self.slot.publish(self.slot.event(EventKind::TaskSkipped));
    }

    /// Hands an error produced after cancellation to the fallback sink.
    fn orphan(&self, error: TaskError) {
        let reason = error.to_string();
        let orphaned = OrphanedError {
            task_id: self.slot.id(),
            task: Arc::clone(self.slot.name()),
            error,
        };
        let ev = match self.fallback.deliver(orphaned) {
            SinkDelivery::Delivered => self
                .slot
                .event(EventKind::OrphanDelivered)
                .with_reason(reason),
            SinkDelivery::Dropped => self.slot.event(EventKind::OrphanDropped).with_reason(reason),
            SinkDelivery::Panicked(info) => self
                .slot
                .event(EventKind::SinkPanicked)
                .with_reason(format!("{info} (while handling: {reason})")),
        };
        self.slot.publish(ev);
    }
}
