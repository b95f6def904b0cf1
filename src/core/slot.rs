//! # Per-task shared state.
//!
//! A [`TaskSlot`] is shared (`Arc`) between the caller's [`TaskHandle`](crate::TaskHandle)
//! and the worker executing the task. It combines:
//! - the terminal-state [`Latch`] (the single synchronization point);
//! - a delivery cell holding registered callbacks and/or a captured result;
//! - the task's [`CancellationToken`] (best-effort interruption);
//! - `watch` channels publishing the terminal state and worker exit.
//!
//! ## Delivery cell
//! ```text
//!             subscribe                 complete (won latch)
//!   Empty ─────────────► Waiting ─────────────────────────► Done  (callback invoked)
//!     │                                                      ▲
//!     │ complete (won latch)          subscribe              │
//!     └────────────────────► Captured ───────────────────────┘  (callback invoked)
//!
//!   cancel (won latch): Empty | Waiting ──► Done  (callbacks dropped, never invoked)
//! ```
//!
//! ## Rules
//! - The latch is moved **before** the cell is touched; the cell lock only moves values.
//! - User callbacks run with **no lock held**, inside `catch_unwind`.
//! - `Captured` is only reachable after completion won, so cancellation never finds a result.

use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::core::latch::{Latch, TaskState};
use crate::error::{SubscribeError, TaskError, panic_message};
use crate::events::{Bus, Event, EventKind};

/// Identifier assigned to each submitted task (monotonic per runner, starting at 1).
pub type TaskId = u64;

type SuccessFn = Box<dyn FnOnce() + Send>;
type ErrorFn = Box<dyn FnOnce(TaskError) + Send>;

/// The pair of callbacks registered through `subscribe`.
pub(crate) struct Callbacks {
    on_success: SuccessFn,
    on_error: ErrorFn,
}

impl Callbacks {
    pub(crate) fn new<S, E>(on_success: S, on_error: E) -> Self
    where
        S: FnOnce() + Send + 'static,
        E: FnOnce(TaskError) + Send + 'static,
    {
        Self {
            on_success: Box::new(on_success),
            on_error: Box::new(on_error),
        }
    }

    fn call(self, outcome: Result<(), TaskError>) {
        match outcome {
            Ok(()) => (self.on_success)(),
            Err(e) => (self.on_error)(e),
        }
    }
}

#[derive(Default)]
enum Delivery {
    #[default]
    Empty,
    Waiting(Callbacks),
    Captured(Result<(), TaskError>),
    Done,
}

#[derive(Default)]
struct Cell {
    subscribed: bool,
    delivery: Delivery,
}

/// What the worker must do with a result after racing for the latch.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Completion {
    /// Completion won; the result went (or will go) to the callbacks.
    Delivered,
    /// Cancellation had already won; the result is orphaned.
    Orphaned(Result<(), TaskError>),
}

pub(crate) struct TaskSlot {
    id: TaskId,
    name: Arc<str>,
    latch: Latch,
    cell: Mutex<Cell>,
    token: CancellationToken,
    state_tx: watch::Sender<TaskState>,
    exited_tx: watch::Sender<bool>,
    bus: Bus,
}

impl TaskSlot {
    pub(crate) fn new(id: TaskId, name: Arc<str>, bus: Bus) -> Self {
        let (state_tx, _) = watch::channel(TaskState::Pending);
        let (exited_tx, _) = watch::channel(false);
        Self {
            id,
            name,
            latch: Latch::new(),
            cell: Mutex::new(Cell::default()),
            token: CancellationToken::new(),
            state_tx,
            exited_tx,
            bus,
        }
    }

    pub(crate) fn id(&self) -> TaskId {
        self.id
    }

    pub(crate) fn name(&self) -> &Arc<str> {
        &self.name
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub(crate) fn state(&self) -> TaskState {
        self.latch.state()
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.latch.is_cancel_requested()
    }

    /// Event of `kind` tagged with this task.
    pub(crate) fn event(&self, kind: EventKind) -> Event {
        Event::new(kind)
            .with_task(Arc::clone(&self.name))
            .with_task_id(self.id)
    }

    pub(crate) fn publish(&self, ev: Event) {
        self.bus.publish(ev);
    }

    /// Requests cancellation. Returns `true` if this call won the latch.
    pub(crate) fn cancel(&self) -> bool {
        if !self.latch.request_cancel() {
            return false;
        }
        let disposed = {
            let mut cell = self.lock_cell();
            match mem::replace(&mut cell.delivery, Delivery::Done) {
                Delivery::Waiting(callbacks) => Some(callbacks),
                _ => None,
            }
        };
        drop(disposed);

        // Published before the token fires: anything the woken worker publishes
        // afterwards carries a larger `seq`.
        self.publish(self.event(EventKind::TaskCancelled));
        self.state_tx.send_replace(TaskState::Cancelled);
        self.token.cancel();
        true
    }

    /// Races the work's result against cancellation.
    pub(crate) fn complete(&self, result: Result<(), TaskError>) -> Completion {
        let target = match result {
            Ok(()) => TaskState::Succeeded,
            Err(_) => TaskState::Failed,
        };
        if self.latch.try_finish(target).is_err() {
            return Completion::Orphaned(result);
        }

        self.state_tx.send_replace(target);
        self.publish(match &result {
            Ok(()) => self.event(EventKind::TaskSucceeded),
            Err(e) => self.event(EventKind::TaskFailed).with_reason(e.to_string()),
        });

        let mut cell = self.lock_cell();
        match mem::replace(&mut cell.delivery, Delivery::Done) {
            Delivery::Waiting(callbacks) => {
                drop(cell);
                self.invoke(callbacks, result);
            }
            _ => cell.delivery = Delivery::Captured(result),
        }
        Completion::Delivered
    }

    /// Registers callbacks; invokes one immediately if the result is already captured.
    pub(crate) fn subscribe(&self, callbacks: Callbacks) -> Result<(), SubscribeError> {
        let mut cell = self.lock_cell();
        if cell.subscribed {
            return Err(SubscribeError::AlreadySubscribed);
        }
        cell.subscribed = true;

        match mem::replace(&mut cell.delivery, Delivery::Done) {
            Delivery::Captured(result) => {
                drop(cell);
                self.invoke(callbacks, result);
            }
            Delivery::Empty if self.latch.state() != TaskState::Cancelled => {
                cell.delivery = Delivery::Waiting(callbacks);
            }
            _ => {
                drop(cell);
                drop(callbacks);
            }
        }
        Ok(())
    }

    /// Waits until the latch reaches a terminal state.
    pub(crate) async fn wait_terminal(&self) -> TaskState {
        let mut rx = self.state_tx.subscribe();
        match rx.wait_for(|s| s.is_terminal()).await {
            Ok(state) => *state,
            Err(_) => self.state(),
        }
    }

    /// Waits until the worker exited and every delivery for this task was made.
    pub(crate) async fn wait_exited(&self) {
        let mut rx = self.exited_tx.subscribe();
        let _ = rx.wait_for(|exited| *exited).await;
    }

    pub(crate) fn mark_exited(&self) {
        self.exited_tx.send_replace(true);
    }

    pub(crate) fn has_exited(&self) -> bool {
        *self.exited_tx.borrow()
    }

    fn invoke(&self, callbacks: Callbacks, result: Result<(), TaskError>) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(move || callbacks.call(result)))
        {
            self.publish(
                self.event(EventKind::CallbackPanicked)
                    .with_reason(panic_message(&*payload)),
            );
        }
    }

    fn lock_cell(&self) -> MutexGuard<'_, Cell> {
        self.cell.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
