//! # LogWriter: simple event printer
//!
//! A minimal subscriber that prints incoming [`Event`]s to stdout.
//! Use it for tests, demos, or as the "at least log it" default for orphaned errors.
//!
//! ## Example output
//! ```text
//! [submitted] task=sleeper id=1
//! [starting] task=sleeper id=1
//! [cancelled] task=sleeper id=1
//! [orphan-dropped] task=sleeper id=1 err="interrupted: sleep interrupted" (no fallback sink configured)
//! [shutdown-requested]
//! [all-stopped-within-grace]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("unknown");
        let id = e.task_id.unwrap_or_default();
        let reason = e.reason.as_deref().unwrap_or("");

        match e.kind {
            EventKind::ShutdownRequested => println!("[shutdown-requested]"),
            EventKind::AllStoppedWithin => println!("[all-stopped-within-grace]"),
            EventKind::GraceExceeded => println!("[grace-exceeded] stuck={reason:?}"),
            EventKind::TaskSubmitted => match e.timeout_ms {
                Some(ms) => println!("[submitted] task={task} id={id} timeout={ms}ms"),
                None => println!("[submitted] task={task} id={id}"),
            },
            EventKind::TaskStarting => println!("[starting] task={task} id={id}"),
            EventKind::TaskSkipped => println!("[skipped] task={task} id={id}"),
            EventKind::TaskSucceeded => println!("[succeeded] task={task} id={id}"),
            EventKind::TaskFailed => println!("[failed] task={task} id={id} err={reason:?}"),
            EventKind::TaskCancelled => println!("[cancelled] task={task} id={id}"),
            EventKind::TimeoutHit => {
                println!(
                    "[timeout] task={task} id={id} timeout={}ms",
                    e.timeout_ms.unwrap_or_default()
                );
            }
            EventKind::SuccessDiscarded => {
                println!("[success-discarded] task={task} id={id}");
            }
            EventKind::OrphanDelivered => {
                println!("[orphan-delivered] task={task} id={id} err={reason:?}");
            }
            EventKind::OrphanDropped => {
                println!(
                    "[orphan-dropped] task={task} id={id} err={reason:?} (no fallback sink configured)"
                );
            }
            EventKind::CallbackPanicked => {
                println!("[callback-panicked] task={task} id={id} info={reason}");
            }
            EventKind::SinkPanicked => {
                println!("[sink-panicked] task={task} id={id} info={reason}");
            }
            EventKind::SubscriberOverflow => {
                println!("[subscriber-overflow] subscriber={task} reason={reason:?}");
            }
            EventKind::SubscriberPanicked => {
                println!("[subscriber-panicked] subscriber={task} info={reason}");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
