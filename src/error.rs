//! Error types used by the scheduler runtime and by tasks.
//!
//! This module defines the error enums of the crate:
//!
//! - [`TaskError`] - conditions raised by a single task execution.
//! - [`RuntimeError`] - errors raised by the scheduling runtime itself.
//! - [`SlotError`] - errors raised by a slot pool.
//!
//! Every enum provides `as_label` (stable snake_case string for logs/metrics)
//! and `as_message` (human-readable detail). [`TaskError::recovery`] maps a
//! task failure onto the recovery the scheduler performs for it.

use std::time::Duration;
use thiserror::Error;

use crate::tasks::TaskKind;

/// # Errors produced by the scheduler runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The worker did not finish within the join timeout during `stop()`.
    #[error("worker for profile {profile} did not stop within {timeout:?}")]
    JoinTimeout {
        /// Profile whose worker was left behind.
        profile: String,
        /// The configured join timeout.
        timeout: Duration,
    },

    /// The task factory has no constructor registered for the kind.
    #[error("no task registered for kind {kind}")]
    UnknownTaskKind {
        /// The requested kind.
        kind: TaskKind,
    },

    /// A scheduler for the profile is already registered in the supervisor.
    #[error("profile {profile} is already registered")]
    ProfileExists {
        /// Duplicate profile id.
        profile: String,
    },

    /// No scheduler is registered for the profile.
    #[error("profile {profile} is not registered")]
    ProfileNotFound {
        /// Requested profile id.
        profile: String,
    },

    /// The scheduler behind a handle no longer exists.
    #[error("scheduler is gone")]
    SchedulerGone,

    /// Shutdown grace period was exceeded; some profiles did not stop in time.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Profiles whose workers did not stop in time.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use profilevisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::JoinTimeout { .. } => "runtime_join_timeout",
            RuntimeError::UnknownTaskKind { .. } => "runtime_unknown_task_kind",
            RuntimeError::ProfileExists { .. } => "runtime_profile_exists",
            RuntimeError::ProfileNotFound { .. } => "runtime_profile_not_found",
            RuntimeError::SchedulerGone => "runtime_scheduler_gone",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::JoinTimeout { profile, timeout } => {
                format!("join timeout after {timeout:?}; profile={profile}")
            }
            RuntimeError::UnknownTaskKind { kind } => format!("unknown task kind: {kind}"),
            RuntimeError::ProfileExists { profile } => format!("duplicate profile: {profile}"),
            RuntimeError::ProfileNotFound { profile } => format!("missing profile: {profile}"),
            RuntimeError::SchedulerGone => "scheduler dropped".to_string(),
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck profiles={stuck:?}")
            }
        }
    }
}

/// # Errors produced by a slot pool.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotError {
    /// The pool was closed; no further slots are handed out.
    #[error("slot pool closed")]
    Closed,
}

impl SlotError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SlotError::Closed => "slot_pool_closed",
        }
    }
}

/// # Conditions raised by a task execution.
///
/// The set is closed: the scheduler classifies each variant into a
/// [`Recovery`] and never lets a failure escape the execution boundary.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum TaskError {
    /// The task lost track of the game navigation (home screen not found).
    #[error("home screen not found: {reason}")]
    HomeNotFound {
        /// What the task was looking for.
        reason: String,
    },

    /// The profile was disconnected (logged in elsewhere, server kick, ...).
    #[error("profile disconnected (resume after {resume_after:?})")]
    ProfileDisconnected {
        /// How long to wait before reconnecting, when known.
        resume_after: Option<Duration>,
    },

    /// The emulator transport failed (adb/device connection).
    #[error("transport error: {error}")]
    Transport {
        /// The underlying error message.
        error: String,
    },

    /// The task asked to stop executing; no automatic recovery.
    #[error("execution stopped: {reason}")]
    StopExecution {
        /// Why the task stopped.
        reason: String,
    },

    /// Task execution exceeded its timeout.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Task body panicked; the panic was caught at the execution boundary.
    #[error("task panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// Any other failure.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },
}

/// Recovery action the scheduler applies after a failed execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recovery {
    /// Nothing beyond logging.
    None,
    /// Enqueue an initialization task.
    Reinitialize,
    /// Dismiss the reconnect prompt and reinitialize right away.
    ReconnectNow,
    /// Pause and reconnect once the delay elapses.
    ReconnectAfter(Duration),
}

impl TaskError {
    /// Convenience constructor for [`TaskError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }

    /// Convenience constructor for [`TaskError::HomeNotFound`].
    pub fn home_not_found(reason: impl Into<String>) -> Self {
        TaskError::HomeNotFound {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use profilevisor::TaskError;
    /// use std::time::Duration;
    ///
    /// let err = TaskError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "task_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::HomeNotFound { .. } => "task_home_not_found",
            TaskError::ProfileDisconnected { .. } => "task_profile_disconnected",
            TaskError::Transport { .. } => "task_transport",
            TaskError::StopExecution { .. } => "task_stop_execution",
            TaskError::Timeout { .. } => "task_timeout",
            TaskError::Panicked { .. } => "task_panicked",
            TaskError::Fail { .. } => "task_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::HomeNotFound { reason } => format!("home not found: {reason}"),
            TaskError::ProfileDisconnected { resume_after } => match resume_after {
                Some(d) => format!("disconnected; resume after {d:?}"),
                None => "disconnected".to_string(),
            },
            TaskError::Transport { error } => format!("transport: {error}"),
            TaskError::StopExecution { reason } => format!("stopped: {reason}"),
            TaskError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            TaskError::Panicked { info } => format!("panic: {info}"),
            TaskError::Fail { error } => format!("error: {error}"),
        }
    }

    /// Classifies the failure into the recovery the scheduler performs.
    ///
    /// `fallback_resume` is used when a disconnect carries no delay of its own
    /// (typically the profile's `reconnect_delay_minutes` setting).
    /// A zero delay counts as unknown.
    ///
    /// # Example
    /// ```
    /// use profilevisor::{Recovery, TaskError};
    /// use std::time::Duration;
    ///
    /// let err = TaskError::ProfileDisconnected { resume_after: None };
    /// assert_eq!(err.recovery(None), Recovery::ReconnectNow);
    /// assert_eq!(
    ///     err.recovery(Some(Duration::from_secs(60))),
    ///     Recovery::ReconnectAfter(Duration::from_secs(60)),
    /// );
    /// ```
    pub fn recovery(&self, fallback_resume: Option<Duration>) -> Recovery {
        match self {
            TaskError::HomeNotFound { .. } | TaskError::Transport { .. } => Recovery::Reinitialize,
            TaskError::ProfileDisconnected { resume_after } => {
                match resume_after.or(fallback_resume).filter(|d| !d.is_zero()) {
                    Some(d) => Recovery::ReconnectAfter(d),
                    None => Recovery::ReconnectNow,
                }
            }
            TaskError::StopExecution { .. }
            | TaskError::Timeout { .. }
            | TaskError::Panicked { .. }
            | TaskError::Fail { .. } => Recovery::None,
        }
    }
}
