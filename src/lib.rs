//! # tasklatch
//!
//! **tasklatch** is a cancellable task runner for tokio with deterministic,
//! exactly-once result delivery.
//!
//! Cancelling a task while it is blocked usually makes the blocked call fail *after*
//! the cancellation took effect. By then the task's subscriber has been disposed, so
//! the error has nowhere to go and is easy to lose. tasklatch resolves that race with a
//! single atomic latch per task and routes such *orphaned* errors to an explicit
//! [`FallbackSink`].
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   TaskRef    │   │   TaskRef    │   │   TaskRef    │
//!     │  (TaskFn)    │   │(BlockingFn)  │   │  (custom)    │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Runner                                                           │
//! │  - Registry (in-flight slots, abort handles)                      │
//! │  - Semaphore (optional max_concurrent)                            │
//! │  - FallbackSink (shared, last setter wins)                        │
//! │  - Bus + listener ─► SubscriberSet (LogWriter, custom, ...)       │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │    Worker    │   │    Worker    │   │    Worker    │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//!     ┌──────────────────────────────────────────────────────┐
//!     │ TaskSlot: Latch (AtomicU8) + delivery cell + token   │
//!     └──────────────────────────────────────────────────────┘
//! ```
//!
//! ### The race
//! ```text
//! worker:  work ─► Ok/Err ─► CAS(Pending → Succeeded/Failed) ─┐
//!                                                            ├─ exactly one wins
//! caller:  cancel() ─────────► CAS(Pending → Cancelled) ─────┘
//!
//! completion won  ─► on_success / on_error (once); later cancel() is a no-op
//! cancel won      ─► callbacks dropped, token fired;
//!                    a later Err  ─► FallbackSink (OrphanedError)
//!                    a later Ok   ─► discarded
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                         |
//! |-------------------|--------------------------------------------------------------|--------------------------------------------|
//! | **Runner**        | Submit, cancel, subscribe, wait, shut down.                  | [`Runner`], [`TaskHandle`], [`TaskState`]  |
//! | **Tasks**         | Async or blocking work, interruptible sleeps.                | [`Task`], [`TaskFn`], [`BlockingTaskFn`]   |
//! | **Fallback**      | Last-resort handler for orphaned errors.                     | [`FallbackSink`], [`ErrorSink`]            |
//! | **Subscriber API**| Hook into runtime events (logging, metrics).                 | [`Subscribe`], [`Event`], [`EventKind`]    |
//! | **Errors**        | Typed errors for tasks and the runtime.                      | [`TaskError`], [`RuntimeError`]            |
//! | **Configuration** | Concurrency, default timeout, grace period.                  | [`RunnerConfig`]                           |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use tasklatch::{FallbackSink, OrphanedError, Runner, RunnerConfig, TaskFn, TaskRef};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orphans = Arc::new(AtomicUsize::new(0));
//!     let fallback = Arc::new(FallbackSink::new());
//!     let seen = Arc::clone(&orphans);
//!     fallback.set(move |_err: OrphanedError| {
//!         seen.fetch_add(1, Ordering::SeqCst);
//!     });
//!
//!     let runner = Runner::builder(RunnerConfig::default())
//!         .with_fallback(fallback)
//!         .build();
//!
//!     // Sleeps 200ms; cancellation interrupts the sleep with an error.
//!     let sleeper: TaskRef = TaskFn::arc("sleeper", |ctx: CancellationToken| async move {
//!         tasklatch::sleep(&ctx, Duration::from_millis(200)).await
//!     });
//!
//!     let handle = runner.submit(sleeper);
//!     handle.subscribe(|| unreachable!(), |_e| unreachable!())?;
//!
//!     tokio::time::sleep(Duration::from_millis(100)).await;
//!     assert!(handle.cancel());
//!     handle.settled().await;
//!
//!     // The interruption error went to the fallback sink, not to the callbacks.
//!     assert_eq!(orphans.load(Ordering::SeqCst), 1);
//!
//!     runner.shutdown().await?;
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod fallback;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use config::RunnerConfig;
pub use crate::core::{Runner, RunnerBuilder, TaskHandle, TaskId, TaskState};
pub use error::{RuntimeError, SubscribeError, TaskError};
pub use events::{Event, EventKind};
pub use fallback::{ErrorSink, FallbackSink, OrphanedError};
pub use subscribers::Subscribe;
pub use tasks::{BlockingTaskFn, BoxTaskFuture, Task, TaskFn, TaskRef, blocking_sleep, sleep};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
