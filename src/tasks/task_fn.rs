//! # Function-backed tasks (`TaskFn`, `BlockingTaskFn`)
//!
//! [`TaskFn`] wraps an async closure `F: Fn(CancellationToken) -> Fut`, producing a fresh
//! future per spawn.
//!
//! [`BlockingTaskFn`] wraps a *blocking* closure `F: Fn(CancellationToken) -> Result<(), TaskError>`
//! and runs it on tokio's blocking pool, so a thread stuck in `std::thread::sleep` or blocking
//! I/O never stalls other tasks. Such a closure cannot be pre-empted: cancelling it only fires
//! the token (see [`blocking_sleep`](crate::blocking_sleep)) and changes where its result is
//! delivered.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use tasklatch::{BlockingTaskFn, TaskError, TaskFn, TaskRef};
//!
//! let t: TaskRef = TaskFn::arc("worker", |ctx: CancellationToken| async move {
//!     if ctx.is_cancelled() {
//!         return Err(TaskError::Canceled);
//!     }
//!     Ok(())
//! });
//! assert_eq!(t.name(), "worker");
//!
//! let b: TaskRef = BlockingTaskFn::arc("sleeper", |ctx: CancellationToken| {
//!     tasklatch::blocking_sleep(&ctx, Duration::from_millis(10))
//! });
//! assert_eq!(b.name(), "sleeper");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::tasks::task::{BoxTaskFuture, Task};

/// Function-backed async task.
///
/// Wraps a closure that *creates* a new future per spawn.
#[derive(Debug)]
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    ///
    /// Prefer [`TaskFn::arc`] when you immediately need a [`TaskRef`](crate::TaskRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the task and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F, Fut> Task for TaskFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn spawn(&self, ctx: CancellationToken) -> BoxTaskFuture {
        Box::pin((self.f)(ctx))
    }
}

/// Function-backed blocking task, executed with [`tokio::task::spawn_blocking`].
#[derive(Debug)]
pub struct BlockingTaskFn<F> {
    name: Cow<'static, str>,
    f: Arc<F>,
}

impl<F> BlockingTaskFn<F> {
    /// Creates a new blocking task.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f: Arc::new(f),
        }
    }

    /// Creates the task and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F> Task for BlockingTaskFn<F>
where
    F: Fn(CancellationToken) -> Result<(), TaskError> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn spawn(&self, ctx: CancellationToken) -> BoxTaskFuture {
        let f = Arc::clone(&self.f);
        Box::pin(async move {
            match tokio::task::spawn_blocking(move || f(ctx)).await {
                Ok(res) => res,
                Err(join) if join.is_panic() => Err(TaskError::from_panic(&*join.into_panic())),
                Err(join) => Err(TaskError::Fatal {
                    error: join.to_string(),
                }),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn task_fn_creates_fresh_future_per_spawn() {
        let t = TaskFn::arc("twice", |_ctx: CancellationToken| async { Ok(()) });
        assert!(t.spawn(CancellationToken::new()).await.is_ok());
        assert!(t.spawn(CancellationToken::new()).await.is_ok());
    }

    #[tokio::test]
    async fn blocking_task_returns_closure_result() {
        let t = BlockingTaskFn::arc("fails", |_ctx: CancellationToken| {
            Err(TaskError::fail("disk full"))
        });
        assert_eq!(
            t.spawn(CancellationToken::new()).await,
            Err(TaskError::fail("disk full"))
        );
    }

    #[tokio::test]
    async fn blocking_panic_becomes_task_error() {
        let t = BlockingTaskFn::arc("panics", |_ctx: CancellationToken| -> Result<(), TaskError> {
            panic!("blocking boom")
        });
        assert_eq!(
            t.spawn(CancellationToken::new()).await,
            Err(TaskError::Panicked {
                info: "blocking boom".into()
            })
        );
    }
}
