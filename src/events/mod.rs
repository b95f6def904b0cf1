//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by task slots, workers,
//! the runner and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `TaskSlot` (latch transitions, callback panics), `Worker`
//!   (start/skip/timeout/orphan routing), `Runner` (submit/shutdown),
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumer**: the runner's listener task, which fans out to `SubscriberSet`.

mod bus;
mod event;

pub(crate) use bus::Bus;
pub use event::{Event, EventKind};
