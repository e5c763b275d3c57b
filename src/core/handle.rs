//! # Restricted scheduler handle.
//!
//! [`SchedulerHandle`] is what tasks (through their
//! [`TaskContext`](crate::TaskContext)) and UI callbacks get instead of the
//! scheduler itself. It holds a weak reference, so it never keeps a stopped
//! and dropped scheduler alive, and it only exposes queue operations.

use std::sync::{Arc, Weak};

use crate::core::Scheduler;
use crate::error::RuntimeError;
use crate::profile::ProfileId;
use crate::tasks::{ScheduledTask, TaskKind};

/// Weak, cloneable handle to a [`Scheduler`].
#[derive(Clone, Default)]
pub struct SchedulerHandle {
    scheduler: Weak<Scheduler>,
}

impl SchedulerHandle {
    pub(crate) fn new(scheduler: Weak<Scheduler>) -> Self {
        Self { scheduler }
    }

    /// A handle bound to no scheduler; every operation is a no-op.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Queues an entry (replacing an equal one); `false` if the scheduler is
    /// gone or the entry belongs to another profile.
    pub fn enqueue(&self, entry: ScheduledTask) -> bool {
        self.upgrade().is_some_and(|s| s.enqueue(entry))
    }

    /// See [`Scheduler::execute_task_now`].
    pub fn execute_task_now(
        &self,
        kind: TaskKind,
        distinct_key: Option<&str>,
    ) -> Result<(), RuntimeError> {
        self.upgrade()
            .ok_or(RuntimeError::SchedulerGone)?
            .execute_task_now(kind, distinct_key)
    }

    /// See [`Scheduler::remove_task`].
    pub fn remove_task(&self, kind: TaskKind, distinct_key: Option<&str>) -> bool {
        self.upgrade()
            .is_some_and(|s| s.remove_task(kind, distinct_key))
    }

    /// See [`Scheduler::is_task_scheduled`].
    pub fn is_task_scheduled(&self, kind: TaskKind, distinct_key: Option<&str>) -> bool {
        self.upgrade()
            .is_some_and(|s| s.is_task_scheduled(kind, distinct_key))
    }

    /// Profile of the scheduler, if it still exists.
    pub fn profile(&self) -> Option<ProfileId> {
        self.upgrade().map(|s| s.profile().clone())
    }

    pub fn is_paused(&self) -> bool {
        self.upgrade().is_some_and(|s| s.is_paused())
    }

    /// True while the scheduler exists and is running.
    pub fn is_running(&self) -> bool {
        self.upgrade().is_some_and(|s| s.is_running())
    }

    fn upgrade(&self) -> Option<Arc<Scheduler>> {
        self.scheduler.upgrade()
    }
}

impl std::fmt::Debug for SchedulerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulerHandle")
            .field("attached", &(self.scheduler.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_handle_is_inert() {
        let handle = SchedulerHandle::detached();
        assert!(!handle.is_running());
        assert!(!handle.is_task_scheduled(TaskKind::Arena, None));
        assert!(!handle.remove_task(TaskKind::Arena, None));
        assert!(handle.profile().is_none());
        assert!(matches!(
            handle.execute_task_now(TaskKind::Arena, None),
            Err(RuntimeError::SchedulerGone)
        ));
    }
}
