//! # Execution context handed to a task.
//!
//! [`TaskContext`] is created by the worker for one execution. It is cheap to
//! clone; all clones share the same schedule cell, so a task may move itself in
//! time from anywhere inside its body (including spawned helpers).
//!
//! After `execute()` returns, the worker reads the final schedule back from the
//! context and applies it to the queue entry.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime};

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::core::SchedulerHandle;
use crate::profile::ProfileId;
use crate::settings::ProfileSettings;

/// Schedule state a task may change during execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Schedule {
    pub scheduled_at: Instant,
    pub recurring: bool,
}

/// Per-execution context: schedule cell, profile settings, scheduler handle
/// and a cancellation token.
#[derive(Clone)]
pub struct TaskContext {
    inner: Arc<Inner>,
}

struct Inner {
    profile: ProfileId,
    schedule: Mutex<Schedule>,
    last_executed_at: Option<SystemTime>,
    settings: Arc<dyn ProfileSettings>,
    handle: SchedulerHandle,
    token: CancellationToken,
}

impl TaskContext {
    pub(crate) fn new(
        profile: ProfileId,
        schedule: Schedule,
        last_executed_at: Option<SystemTime>,
        settings: Arc<dyn ProfileSettings>,
        handle: SchedulerHandle,
        token: CancellationToken,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                profile,
                schedule: Mutex::new(schedule),
                last_executed_at,
                settings,
                handle,
                token,
            }),
        }
    }

    /// Profile this execution belongs to.
    pub fn profile(&self) -> &ProfileId {
        &self.inner.profile
    }

    /// Current `scheduled_at` (reflects reschedules made so far).
    pub fn scheduled_at(&self) -> Instant {
        self.lock().scheduled_at
    }

    /// Whether the task will be re-enqueued after this run.
    pub fn is_recurring(&self) -> bool {
        self.lock().recurring
    }

    /// Start of the previous run, if any.
    pub fn last_executed_at(&self) -> Option<SystemTime> {
        self.inner.last_executed_at
    }

    /// Moves the task to `at`.
    pub fn reschedule(&self, at: Instant) {
        self.lock().scheduled_at = at;
    }

    /// Moves the task to `now + delay`.
    pub fn reschedule_in(&self, delay: Duration) {
        self.reschedule(Instant::now() + delay);
    }

    /// Moves the task to `now + delay + <kind>_offset_minutes`.
    pub fn reschedule_with_offset(&self, delay: Duration, kind: crate::tasks::TaskKind) {
        let offset = self.inner.settings.task_offset(kind);
        self.reschedule_in(delay + offset);
    }

    /// Sets recurrence; `false` makes this the last run.
    pub fn set_recurring(&self, recurring: bool) {
        self.lock().recurring = recurring;
    }

    /// Live profile settings.
    pub fn settings(&self) -> &dyn ProfileSettings {
        self.inner.settings.as_ref()
    }

    /// Restricted handle to the owning scheduler.
    pub fn handle(&self) -> &SchedulerHandle {
        &self.inner.handle
    }

    /// Token cancelled when the scheduler stops.
    pub fn token(&self) -> &CancellationToken {
        &self.inner.token
    }

    /// Shorthand for `token().is_cancelled()`.
    pub fn is_cancelled(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    pub(crate) fn schedule(&self) -> Schedule {
        *self.lock()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Schedule> {
        self.inner
            .schedule
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{MemorySettings, keys};
    use crate::tasks::TaskKind;

    fn context(settings: Arc<dyn ProfileSettings>) -> TaskContext {
        TaskContext::new(
            ProfileId::from("main"),
            Schedule {
                scheduled_at: Instant::now(),
                recurring: true,
            },
            None,
            settings,
            SchedulerHandle::detached(),
            CancellationToken::new(),
        )
    }

    #[test]
    fn clones_share_the_schedule_cell() {
        let ctx = context(Arc::new(MemorySettings::new()));
        let before = ctx.scheduled_at();
        let clone = ctx.clone();
        clone.reschedule_in(Duration::from_secs(60));
        clone.set_recurring(false);

        let schedule = ctx.schedule();
        assert!(schedule.scheduled_at >= before + Duration::from_secs(60));
        assert!(!schedule.recurring);
    }

    #[test]
    fn offset_is_added_from_settings() {
        let settings = MemorySettings::new();
        settings.set(&keys::task_offset(TaskKind::TrainTroops), "2");
        let ctx = context(Arc::new(settings));
        let before = Instant::now();
        ctx.reschedule_with_offset(Duration::from_secs(60), TaskKind::TrainTroops);
        assert!(ctx.scheduled_at() >= before + Duration::from_secs(180));
    }
}
