//! # Queue entries: identity, schedule and ordering.
//!
//! [`ScheduledTask`] bundles a [`TaskRef`] with its owning profile and its
//! scheduling state (next run instant, recurrence, last run, cooldown strikes).
//!
//! ## Identity
//! Two entries are the *same logical task* iff kind, profile and distinct key
//! are equal ([`TaskIdentity`]). `PartialEq`/`Hash` on [`ScheduledTask`] follow
//! that identity and ignore the schedule.
//!
//! ## Ordering
//! ```text
//! Initialize (any delay)  <  everything else by ascending scheduled_at
//! ```
//! There is no `Ord` impl since `Eq` follows identity; use
//! [`ScheduledTask::cmp_priority`]. The queue adds an insertion sequence as
//! final tie-breaker.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::time::Instant;

use crate::profile::ProfileId;
use crate::tasks::{TaskKind, TaskRef};

/// Logical identity of a task: kind, owning profile and distinct key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TaskIdentity {
    kind: TaskKind,
    profile: ProfileId,
    distinct_key: Option<Arc<str>>,
}

impl TaskIdentity {
    /// Creates an identity.
    pub fn new(kind: TaskKind, profile: ProfileId, distinct_key: Option<&str>) -> Self {
        Self {
            kind,
            profile,
            distinct_key: distinct_key.map(Arc::from),
        }
    }

    /// Task kind.
    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Owning profile.
    pub fn profile(&self) -> &ProfileId {
        &self.profile
    }

    /// Secondary discriminator, if any.
    pub fn distinct_key(&self) -> Option<&str> {
        self.distinct_key.as_deref()
    }
}

impl fmt::Display for TaskIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.distinct_key {
            Some(key) => write!(f, "{} ({key})", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// A task placed in (or destined for) a scheduler queue.
#[derive(Clone)]
pub struct ScheduledTask {
    task: TaskRef,
    identity: TaskIdentity,
    scheduled_at: Instant,
    recurring: bool,
    last_executed_at: Option<SystemTime>,
    strikes: u32,
}

impl ScheduledTask {
    /// Wraps `task` for `profile`, due now and recurring.
    pub fn new(task: TaskRef, profile: ProfileId) -> Self {
        let identity = TaskIdentity::new(task.kind(), profile, task.distinct_key());
        Self {
            task,
            identity,
            scheduled_at: Instant::now(),
            recurring: true,
            last_executed_at: None,
            strikes: 0,
        }
    }

    /// Returns the entry scheduled at `at`.
    pub fn at(mut self, at: Instant) -> Self {
        self.scheduled_at = at;
        self
    }

    /// Returns the entry scheduled `delay` from now.
    pub fn after(self, delay: Duration) -> Self {
        self.at(Instant::now() + delay)
    }

    /// Returns the entry with the given recurrence.
    pub fn with_recurring(mut self, recurring: bool) -> Self {
        self.recurring = recurring;
        self
    }

    /// Returns a one-shot entry.
    pub fn one_shot(self) -> Self {
        self.with_recurring(false)
    }

    /// The behaviour.
    pub fn task(&self) -> &TaskRef {
        &self.task
    }

    /// Logical identity.
    pub fn identity(&self) -> &TaskIdentity {
        &self.identity
    }

    /// Task kind.
    pub fn kind(&self) -> TaskKind {
        self.identity.kind
    }

    /// Owning profile.
    pub fn profile(&self) -> &ProfileId {
        &self.identity.profile
    }

    /// Human-readable name (`"Gather Resources (wood)"`).
    pub fn name(&self) -> String {
        self.identity.to_string()
    }

    /// Next instant at which the entry becomes eligible.
    pub fn scheduled_at(&self) -> Instant {
        self.scheduled_at
    }

    /// Whether the entry is re-enqueued after each run.
    pub fn is_recurring(&self) -> bool {
        self.recurring
    }

    /// Wall-clock time of the most recent run start.
    pub fn last_executed_at(&self) -> Option<SystemTime> {
        self.last_executed_at
    }

    /// Signed delay until eligibility in milliseconds (negative = overdue).
    pub fn delay_millis(&self, now: Instant) -> i64 {
        if self.scheduled_at >= now {
            duration_millis(self.scheduled_at - now)
        } else {
            -duration_millis(now - self.scheduled_at)
        }
    }

    /// Remaining delay, zero when overdue.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.scheduled_at.saturating_duration_since(now)
    }

    /// True when the delay is `<= 0`.
    pub fn is_due(&self, now: Instant) -> bool {
        self.scheduled_at <= now
    }

    /// Queue order: initialization first, then ascending `scheduled_at`.
    pub fn cmp_priority(&self, other: &Self) -> Ordering {
        self.kind()
            .priority_rank()
            .cmp(&other.kind().priority_rank())
            .then(self.scheduled_at.cmp(&other.scheduled_at))
    }

    pub(crate) fn reschedule(&mut self, at: Instant) {
        self.scheduled_at = at;
    }

    pub(crate) fn set_recurring(&mut self, recurring: bool) {
        self.recurring = recurring;
    }

    pub(crate) fn mark_started(&mut self, at: SystemTime) {
        self.last_executed_at = Some(at);
    }

    pub(crate) fn strikes(&self) -> u32 {
        self.strikes
    }

    pub(crate) fn set_strikes(&mut self, strikes: u32) {
        self.strikes = strikes;
    }
}

impl PartialEq for ScheduledTask {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}

impl Eq for ScheduledTask {}

impl std::hash::Hash for ScheduledTask {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.identity.hash(state);
    }
}

impl fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("identity", &self.identity)
            .field("scheduled_at", &self.scheduled_at)
            .field("recurring", &self.recurring)
            .field("last_executed_at", &self.last_executed_at)
            .field("strikes", &self.strikes)
            .finish()
    }
}

fn duration_millis(d: Duration) -> i64 {
    d.as_millis().min(i64::MAX as u128) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::noop_task;

    fn profile() -> ProfileId {
        ProfileId::from("main")
    }

    #[test]
    fn identity_ignores_schedule() {
        let a = ScheduledTask::new(noop_task(TaskKind::Gather, Some("wood")), profile());
        let b = ScheduledTask::new(noop_task(TaskKind::Gather, Some("wood")), profile())
            .after(Duration::from_secs(7200))
            .one_shot();
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_key_and_profile_split_identity() {
        let wood = ScheduledTask::new(noop_task(TaskKind::Gather, Some("wood")), profile());
        let iron = ScheduledTask::new(noop_task(TaskKind::Gather, Some("iron")), profile());
        let other = ScheduledTask::new(noop_task(TaskKind::Gather, Some("wood")), "alt".into());
        assert_ne!(wood, iron);
        assert_ne!(wood, other);
    }

    #[test]
    fn initialize_sorts_first_regardless_of_delay() {
        let base = Instant::now();
        let init = ScheduledTask::new(noop_task(TaskKind::Initialize, None), profile())
            .at(base + Duration::from_secs(7200));
        let overdue = ScheduledTask::new(noop_task(TaskKind::Arena, None), profile()).at(base);
        assert_eq!(init.cmp_priority(&overdue), Ordering::Less);
    }

    #[test]
    fn delay_is_signed() {
        let base = Instant::now();
        let now = base + Duration::from_millis(1500);
        let late = ScheduledTask::new(noop_task(TaskKind::Arena, None), profile()).at(base);
        assert_eq!(late.delay_millis(now), -1500);
        assert_eq!(late.delay_millis(base), 0);
        assert!(late.is_due(now));
        assert_eq!(late.remaining(now), Duration::ZERO);
    }

    #[test]
    fn name_includes_distinct_key() {
        let wood = ScheduledTask::new(noop_task(TaskKind::Gather, Some("wood")), profile());
        assert_eq!(wood.name(), "Gather Resources (wood)");
    }
}
