//! Error types used by the tasklatch runtime and tasks.
//!
//! This module defines three error enums:
//!
//! - [`RuntimeError`]: errors raised by the runner itself (shutdown).
//! - [`TaskError`]: errors produced by a task's work.
//! - [`SubscribeError`]: misuse of [`TaskHandle::subscribe`](crate::TaskHandle::subscribe).
//!
//! `RuntimeError` and `TaskError` provide helper methods (`as_label`, `as_message`)
//! for logging/metrics.

use std::any::Any;
use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the tasklatch runtime.
///
/// These represent failures of the runner itself, such as a shutdown
/// sequence exceeding its grace period.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some tasks remained stuck and were aborted.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}; forcing termination")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of the tasks that did not settle in time.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use tasklatch::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck tasks={stuck:?}")
            }
        }
    }
}

/// # Errors produced by task work.
///
/// A task returns one of these from its future. The runner never lets them
/// escape: each one is delivered either to the task's `on_error` callback or,
/// when cancellation already won, to the [`FallbackSink`](crate::FallbackSink).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Non-recoverable error reported by the work.
    #[error("fatal error: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// Work failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// A blocking operation inside the work was woken up by cancellation.
    #[error("interrupted: {reason}")]
    Interrupted {
        /// What was interrupted (e.g. "sleep interrupted").
        reason: String,
    },

    /// Work panicked; the panic was caught by the runner.
    #[error("task panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// Work observed its cancellation token and gave up.
    #[error("context cancelled")]
    Canceled,
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }

    /// Shorthand for [`TaskError::Interrupted`].
    pub fn interrupted(reason: impl Into<String>) -> Self {
        TaskError::Interrupted {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use tasklatch::TaskError;
    ///
    /// let err = TaskError::interrupted("sleep interrupted");
    /// assert_eq!(err.as_label(), "task_interrupted");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fatal { .. } => "task_fatal",
            TaskError::Fail { .. } => "task_failed",
            TaskError::Interrupted { .. } => "task_interrupted",
            TaskError::Panicked { .. } => "task_panicked",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Fatal { error } => format!("fatal: {error}"),
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Interrupted { reason } => format!("interrupted: {reason}"),
            TaskError::Panicked { info } => format!("panicked: {info}"),
            TaskError::Canceled => "context cancelled".to_string(),
        }
    }

    /// Indicates whether the error is a reaction to cancellation
    /// ([`TaskError::Interrupted`] or [`TaskError::Canceled`]).
    ///
    /// # Example
    /// ```
    /// use tasklatch::TaskError;
    ///
    /// assert!(TaskError::Canceled.is_interruption());
    /// assert!(!TaskError::fail("boom").is_interruption());
    /// ```
    pub fn is_interruption(&self) -> bool {
        matches!(self, TaskError::Interrupted { .. } | TaskError::Canceled)
    }

    pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
        TaskError::Panicked {
            info: panic_message(payload),
        }
    }
}

/// # Errors returned by [`TaskHandle::subscribe`](crate::TaskHandle::subscribe).
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeError {
    /// Callbacks were already registered for this task; the new ones were dropped.
    #[error("task already has a subscriber")]
    AlreadySubscribed,
}

/// Renders a caught panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        assert_eq!(TaskError::fail("x").as_label(), "task_failed");
        assert_eq!(
            TaskError::Fatal { error: "x".into() }.as_label(),
            "task_fatal"
        );
        assert_eq!(
            TaskError::Panicked { info: "x".into() }.as_label(),
            "task_panicked"
        );
        assert_eq!(TaskError::Canceled.as_label(), "task_canceled");
    }

    #[test]
    fn display_includes_detail() {
        let err = TaskError::interrupted("sleep interrupted");
        assert_eq!(err.to_string(), "interrupted: sleep interrupted");
        assert_eq!(err.as_message(), "interrupted: sleep interrupted");
    }

    #[test]
    fn panic_payloads_are_rendered() {
        let static_payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(&*static_payload), "boom");

        let owned_payload: Box<dyn Any + Send> = Box::new(String::from("owned boom"));
        assert_eq!(
            TaskError::from_panic(&*owned_payload),
            TaskError::Panicked {
                info: "owned boom".into()
            }
        );

        let opaque: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(&*opaque), "unknown panic");
    }

    #[test]
    fn grace_exceeded_message_lists_stuck_tasks() {
        let err = RuntimeError::GraceExceeded {
            grace: Duration::from_millis(10),
            stuck: vec!["sleeper".into()],
        };
        assert!(err.as_message().contains("sleeper"));
        assert_eq!(err.as_label(), "runtime_grace_exceeded");
    }
}
