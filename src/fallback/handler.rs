//! # Process-wide fallback for orphaned errors.
//!
//! [`FallbackSink`] is the explicit configuration object a [`Runner`](crate::Runner) routes
//! orphaned errors to. Share one `Arc<FallbackSink>` between every runner of the process
//! (and the code that configures it) instead of relying on an ambient global.
//!
//! ## Rules
//! - **Last setter wins**: [`FallbackSink::set`] replaces any previous sink.
//! - **Effective immediately**: errors orphaned after `set` returns go to the new sink.
//! - **Unset means dropped**: without a sink, orphaned errors are discarded and reported
//!   as `EventKind::OrphanDropped` so a logging subscriber can still see them.
//! - **Read-mostly**: delivery clones the current `Arc` under a read lock and calls the sink
//!   with no lock held.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::panic_message;
use crate::fallback::sink::{ErrorSink, OrphanedError};

/// Result of routing one orphaned error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SinkDelivery {
    /// The sink received the error.
    Delivered,
    /// No sink was configured; the error was dropped.
    Dropped,
    /// The sink panicked while handling the error.
    Panicked(String),
}

/// Holder of the process-wide [`ErrorSink`].
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use tasklatch::{FallbackSink, OrphanedError};
///
/// let fallback = Arc::new(FallbackSink::new());
/// assert!(!fallback.is_set());
///
/// fallback.set(|err: OrphanedError| eprintln!("global error: {}", err.error));
/// assert!(fallback.is_set());
/// ```
#[derive(Default)]
pub struct FallbackSink {
    sink: RwLock<Option<Arc<dyn ErrorSink>>>,
}

impl FallbackSink {
    /// Creates an unset fallback (orphaned errors are dropped).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `sink`, replacing any previous one.
    pub fn set<S: ErrorSink>(&self, sink: S) {
        self.set_arc(Arc::new(sink));
    }

    /// Installs an already shared sink, replacing any previous one.
    pub fn set_arc(&self, sink: Arc<dyn ErrorSink>) {
        *self.sink.write().unwrap_or_else(PoisonError::into_inner) = Some(sink);
    }

    /// Removes the sink; subsequent orphaned errors are dropped.
    pub fn clear(&self) {
        *self.sink.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Returns `true` if a sink is installed.
    pub fn is_set(&self) -> bool {
        self.current().is_some()
    }

    /// Routes one orphaned error to the current sink.
    pub(crate) fn deliver(&self, err: OrphanedError) -> SinkDelivery {
        let Some(sink) = self.current() else {
            return SinkDelivery::Dropped;
        };
        match panic::catch_unwind(AssertUnwindSafe(|| sink.on_orphaned(err))) {
            Ok(()) => SinkDelivery::Delivered,
            Err(payload) => SinkDelivery::Panicked(panic_message(&*payload)),
        }
    }

    fn current(&self) -> Option<Arc<dyn ErrorSink>> {
        self.sink
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl fmt::Debug for FallbackSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.current().map(|s| s.name());
        f.debug_struct("FallbackSink").field("sink", &name).finish()
    }
}
