//! # Fallback delivery for orphaned errors.
//!
//! - [`ErrorSink`] - trait implemented by last-resort error handlers (closures included)
//! - [`OrphanedError`] - an error produced after cancellation won, tagged with its task
//! - [`FallbackSink`] - shared, settable holder a runner routes orphaned errors to

mod handler;
mod sink;

pub(crate) use handler::SinkDelivery;
pub use handler::FallbackSink;
pub use sink::{ErrorSink, OrphanedError};
