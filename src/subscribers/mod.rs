//! # Event subscribers for the tasklatch runtime.
//!
//! This module provides the [`Subscribe`] trait, the internal `SubscriberSet` fan-out and the
//! optional built-in [`LogWriter`] (feature `logging`).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   TaskSlot / Worker ── publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit
//!                                                                   │
//!                                                       ┌───────────┼──────────┐
//!                                                       ▼           ▼          ▼
//!                                                   LogWriter    Metrics    Custom
//! ```
//!
//! Subscribers are the crate's logging surface: an orphaned error dropped for lack of a
//! fallback sink still shows up as `EventKind::OrphanDropped`.
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use tasklatch::{Subscribe, Event, EventKind};
//! use async_trait::async_trait;
//!
//! struct OrphanAlarm;
//!
//! #[async_trait]
//! impl Subscribe for OrphanAlarm {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::OrphanDropped {
//!             // page someone
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "orphan-alarm" }
//! }
//! ```

#[cfg(feature = "logging")]
mod log;
mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use subscriber::Subscribe;
pub(crate) use subscriber_set::SubscriberSet;
