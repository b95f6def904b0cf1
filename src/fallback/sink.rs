//! # Orphaned-error sink trait.
//!
//! Provides [`ErrorSink`], the extension point that receives [`OrphanedError`]s: errors
//! produced by work *after* cancellation already won the terminal-state race, so the
//! task's own `on_error` callback is no longer live.
//!
//! Any `Fn(OrphanedError) + Send + Sync + 'static` closure is an `ErrorSink`.
//!
//! ## Example
//! ```rust
//! use tasklatch::{ErrorSink, OrphanedError};
//!
//! struct Stderr;
//!
//! impl ErrorSink for Stderr {
//!     fn on_orphaned(&self, err: OrphanedError) {
//!         eprintln!("orphaned: {err}");
//!     }
//!
//!     fn name(&self) -> &'static str { "stderr" }
//! }
//! ```

use std::sync::Arc;

use thiserror::Error;

use crate::core::TaskId;
use crate::error::TaskError;

/// Error produced by a task after its cancellation won the race.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("orphaned error from task {task:?} (id {task_id}): {error}")]
pub struct OrphanedError {
    /// Id of the cancelled task.
    pub task_id: TaskId,
    /// Name of the cancelled task.
    pub task: Arc<str>,
    /// The error the work produced.
    #[source]
    pub error: TaskError,
}

impl OrphanedError {
    /// Returns the wrapped task error, consuming the wrapper.
    pub fn into_inner(self) -> TaskError {
        self.error
    }
}

/// Last-resort handler for orphaned errors.
///
/// ### Implementation requirements
/// - Called synchronously on the worker that observed the error; keep it short.
/// - Panics are caught; the runtime publishes `EventKind::SinkPanicked`.
pub trait ErrorSink: Send + Sync + 'static {
    /// Handles one orphaned error.
    fn on_orphaned(&self, err: OrphanedError);

    /// Returns the sink name used in events.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose - override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl<F> ErrorSink for F
where
    F: Fn(OrphanedError) + Send + Sync + 'static,
{
    fn on_orphaned(&self, err: OrphanedError) {
        self(err)
    }
}
