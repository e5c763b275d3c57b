//! # Runtime events emitted by schedulers and the supervisor.
//!
//! The [`EventKind`] enum classifies events across five categories:
//! - **Scheduler lifecycle**: started/stopped, paused/resumed, status lines
//! - **Slot and idle**: waiting for a slot, acquired, released, idle enter/exit
//! - **Task lifecycle**: scheduled, starting, completed, failed, dropped, removed
//! - **Recovery**: reconnect armed/fired, cooldown applied
//! - **Runtime**: shutdown, subscriber overflow/panic
//!
//! The [`Event`] struct carries the profile, task name and kind, next/last run
//! times for the task-state mirror, reasons and delays.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore order when events are delivered out of
//! order (the [`TaskStateMirror`](crate::TaskStateMirror) does).
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use profilevisor::{Event, EventKind, TaskKind};
//!
//! let ev = Event::new(EventKind::TaskFailed)
//!     .with_profile("main")
//!     .with_task("Gather Resources (wood)", TaskKind::Gather)
//!     .with_reason("march slots full")
//!     .with_delay(Duration::from_secs(5));
//!
//! assert_eq!(ev.kind, EventKind::TaskFailed);
//! assert_eq!(ev.profile.as_deref(), Some("main"));
//! assert_eq!(ev.task_kind, Some(TaskKind::Gather));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use tokio::time::Instant;

use crate::tasks::TaskKind;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Scheduler lifecycle ===
    /// Worker started for a profile.
    SchedulerStarted,
    /// Scheduler stopped; queue cleared.
    SchedulerStopped,
    /// Execution suspended (explicit pause or disconnect).
    Paused,
    /// Execution resumed.
    Resumed,
    /// One-line human readable status (`status` is set).
    Status,

    // === Slot and idle ===
    /// Waiting for a slot (`position` is set, 1-based).
    SlotWaiting,
    /// Slot granted.
    SlotAcquired,
    /// Slot released.
    SlotReleased,
    /// Emulator closed and slot released; `delay_ms` = soonest delay.
    IdleEntered,
    /// Slot re-acquired after idling; initialization enqueued.
    IdleExited,

    // === Task lifecycle ===
    /// Task placed in the queue (`next_run` is set).
    TaskScheduled,
    /// Task execution starting (`last_run` is set).
    TaskStarting,
    /// Task execution returned `Ok`.
    TaskCompleted,
    /// Task execution failed (`reason` = error message).
    TaskFailed,
    /// One-shot task finished and was discarded.
    TaskDropped,
    /// Task removed from the queue by request.
    TaskRemoved,
    /// Minimum cooldown applied (`delay_ms` = cooldown).
    CooldownApplied,

    // === Recovery ===
    /// Reconnect timer armed (`delay_ms` = wait).
    ReconnectArmed,
    /// Reconnect performed: resumed, prompt dismissed, initialization queued.
    ReconnectFired,
    /// Alliance help side check tapped "help".
    HelpRequested,

    // === Runtime ===
    /// Shutdown requested (OS signal or explicit).
    ShutdownRequested,
    /// All schedulers stopped within the grace period.
    AllStoppedWithin,
    /// Grace period exceeded; some schedulers did not stop in time.
    GraceExceeded,
    /// Subscriber panicked during event processing (`task` = subscriber name).
    SubscriberPanicked,
    /// Subscriber dropped an event (`task` = subscriber name).
    SubscriberOverflow,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Profile the event belongs to.
    pub profile: Option<Arc<str>>,
    /// Task display name (or subscriber name for subscriber events).
    pub task: Option<Arc<str>>,
    /// Task kind, for task events.
    pub task_kind: Option<TaskKind>,
    /// Status line for [`EventKind::Status`].
    pub status: Option<Arc<str>>,
    /// Human-readable reason (errors, recovery details).
    pub reason: Option<Arc<str>>,
    /// Delay in milliseconds (cooldown, reconnect wait, idle horizon).
    pub delay_ms: Option<u64>,
    /// Position in the slot queue (1-based).
    pub position: Option<usize>,
    /// Next execution time of the task.
    pub next_run: Option<SystemTime>,
    /// Last execution start of the task.
    pub last_run: Option<SystemTime>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            profile: None,
            task: None,
            task_kind: None,
            status: None,
            reason: None,
            delay_ms: None,
            position: None,
            next_run: None,
            last_run: None,
        }
    }

    /// Attaches a profile id.
    #[inline]
    pub fn with_profile(mut self, profile: impl Into<Arc<str>>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Attaches a task display name and kind.
    #[inline]
    pub fn with_task(mut self, name: impl Into<Arc<str>>, kind: TaskKind) -> Self {
        self.task = Some(name.into());
        self.task_kind = Some(kind);
        self
    }

    /// Attaches a status line.
    #[inline]
    pub fn with_status(mut self, status: impl Into<Arc<str>>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(d.as_millis().min(u128::from(u64::MAX)) as u64);
        self
    }

    /// Attaches a slot queue position.
    #[inline]
    pub fn with_position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    /// Attaches the next execution time, converted from a scheduler instant.
    #[inline]
    pub fn with_next_run(mut self, at: Instant) -> Self {
        self.next_run = Some(wall_clock(at));
        self
    }

    /// Attaches the last execution start.
    #[inline]
    pub fn with_last_run(mut self, at: Option<SystemTime>) -> Self {
        self.last_run = at;
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        let mut ev = Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"));
        ev.task = Some(Arc::from(subscriber));
        ev
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        let mut ev = Event::new(EventKind::SubscriberPanicked).with_reason(info);
        ev.task = Some(Arc::from(subscriber));
        ev
    }

    /// True for events produced by the subscriber machinery itself.
    #[inline]
    pub fn is_subscriber_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}

/// Converts a scheduler instant into wall-clock time.
pub(crate) fn wall_clock(at: Instant) -> SystemTime {
    let now = Instant::now();
    let wall = SystemTime::now();
    if at >= now {
        wall + (at - now)
    } else {
        wall.checked_sub(now - at).unwrap_or(wall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::Status);
        let b = Event::new(EventKind::Status);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn next_run_is_in_the_future() {
        let ev = Event::new(EventKind::TaskScheduled)
            .with_next_run(Instant::now() + Duration::from_secs(3600));
        let next = ev.next_run.expect("next_run set");
        assert!(next > SystemTime::now() + Duration::from_secs(3500));
    }

    #[test]
    fn subscriber_events_are_tagged() {
        let ev = Event::subscriber_overflow("log", "full");
        assert!(ev.is_subscriber_event());
        assert_eq!(ev.task.as_deref(), Some("log"));
    }
}
