//! Runtime core: submission, cancellation race and delivery.
//!
//! The public API from this module is [`Runner`], [`RunnerBuilder`], [`TaskHandle`],
//! [`TaskState`] and [`TaskId`].
//!
//! Internal modules:
//! - [`latch`]: the atomic terminal-state field (one CAS decides delivery);
//! - [`slot`]: per-task shared state (latch, callbacks, captured result, token);
//! - [`worker`]: executes one task with permit, timeout and panic isolation;
//! - [`registry`]: in-flight tasks for `cancel_all` and shutdown;
//! - [`runner`]: submission, event fan-out and grace-bounded shutdown.

mod builder;
mod handle;
mod latch;
mod registry;
mod runner;
mod slot;
mod worker;

pub use builder::RunnerBuilder;
pub use handle::TaskHandle;
pub use latch::TaskState;
pub use runner::Runner;
pub use slot::TaskId;
