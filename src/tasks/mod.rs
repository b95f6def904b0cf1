//! # Task abstractions.
//!
//! This module provides the task-related types:
//! - [`Task`] - trait for implementing async cancelable tasks
//! - [`TaskFn`] - async function-based task implementation
//! - [`BlockingTaskFn`] - blocking function-based task, run on the blocking pool
//! - [`TaskRef`] - shared reference to a task (`Arc<dyn Task>`)
//! - [`sleep`] / [`blocking_sleep`] - waits that turn cancellation into an interruption error

mod interrupt;
mod task;
mod task_fn;

pub use interrupt::{blocking_sleep, sleep};
pub use task::{BoxTaskFuture, Task, TaskRef};
pub use task_fn::{BlockingTaskFn, TaskFn};
