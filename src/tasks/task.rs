//! # Task abstraction.
//!
//! This module defines the [`Task`] trait (async, cancelable) and the shared handle type
//! [`TaskRef`], an `Arc<dyn Task>` suitable for sharing across the runtime.
//!
//! A task receives a [`CancellationToken`]. Cancelling the task fires the token, which is
//! the best-effort interruption signal: work that waits on it can return early (usually with
//! [`TaskError::Interrupted`]); work that ignores it simply runs to completion.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Boxed future produced by [`Task::spawn`].
pub type BoxTaskFuture = Pin<Box<dyn Future<Output = Result<(), TaskError>> + Send + 'static>>;

/// Shared handle to a task.
pub type TaskRef = Arc<dyn Task>;

/// # Asynchronous, cancelable unit of work.
///
/// A `Task` has a stable [`name`](Task::name) and a [`spawn`](Task::spawn) method that
/// creates a fresh future for one execution.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use tasklatch::{BoxTaskFuture, Task, TaskError};
///
/// struct Demo;
///
/// impl Task for Demo {
///     fn name(&self) -> &str { "demo" }
///
///     fn spawn(&self, ctx: CancellationToken) -> BoxTaskFuture {
///         Box::pin(async move {
///             if ctx.is_cancelled() {
///                 return Err(TaskError::Canceled);
///             }
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait Task: Send + Sync + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Creates the future that performs the work.
    fn spawn(&self, ctx: CancellationToken) -> BoxTaskFuture;
}
