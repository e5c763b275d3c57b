//! # Per-profile task queue.
//!
//! [`TaskQueue`] is a mutex-guarded ordered map with an identity index. The
//! worker and external callers (GUI actions, tasks through their handle)
//! mutate it concurrently.
//!
//! ## Layout
//! ```text
//! order: BTreeMap<QueueKey{rank, at, seq}, ScheduledTask>   execution order
//! index: HashMap<TaskIdentity, QueueKey>                    dedup / lookup
//! ```
//!
//! ## Rules
//! - At most one entry per [`TaskIdentity`]
//! - `push` replaces an equal entry
//! - `merge` (re-insert after execution) keeps the earliest schedule and is
//!   recurring if either copy was
//! - `Initialize` always sorts first; others by `scheduled_at`, then insertion

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::tasks::{ScheduledTask, TaskIdentity};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct QueueKey {
    rank: u8,
    at: Instant,
    seq: u64,
}

#[derive(Default)]
struct QueueState {
    order: BTreeMap<QueueKey, ScheduledTask>,
    index: HashMap<TaskIdentity, QueueKey>,
    next_seq: u64,
}

impl QueueState {
    fn insert(&mut self, entry: ScheduledTask) -> Option<ScheduledTask> {
        let previous = self.take(entry.identity());
        let key = QueueKey {
            rank: entry.kind().priority_rank(),
            at: entry.scheduled_at(),
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.index.insert(entry.identity().clone(), key);
        self.order.insert(key, entry);
        previous
    }

    fn take(&mut self, id: &TaskIdentity) -> Option<ScheduledTask> {
        let key = self.index.remove(id)?;
        self.order.remove(&key)
    }
}

/// Outcome of [`TaskQueue::force_now`] and [`TaskQueue::bring_forward`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Forced {
    /// An equal entry was queued and moved to now.
    Moved,
    /// The prototype was inserted one-shot.
    Inserted,
    /// An equal entry was already due; nothing changed.
    AlreadyDue,
}

/// Thread-safe priority queue of [`ScheduledTask`]s for one profile.
#[derive(Default)]
pub struct TaskQueue {
    inner: Mutex<QueueState>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry, replacing (and returning) an equal one.
    pub fn push(&self, entry: ScheduledTask) -> Option<ScheduledTask> {
        self.lock().insert(entry)
    }

    /// Re-inserts an executed entry, merging with an equal entry queued
    /// meanwhile: earliest schedule wins, recurring if either was.
    pub(crate) fn merge(&self, mut entry: ScheduledTask) {
        let mut state = self.lock();
        if let Some(queued) = state.take(entry.identity()) {
            if queued.scheduled_at() < entry.scheduled_at() {
                entry.reschedule(queued.scheduled_at());
            }
            let recurring = entry.is_recurring() || queued.is_recurring();
            entry.set_recurring(recurring);
        }
        state.insert(entry);
    }

    /// Removes and returns the first entry in execution order that is due.
    pub(crate) fn pop_due(&self, now: Instant) -> Option<ScheduledTask> {
        let mut state = self.lock();
        let key = state
            .order
            .keys()
            .find(|k| k.at <= now)
            .copied()?;
        let entry = state.order.remove(&key)?;
        state.index.remove(entry.identity());
        Some(entry)
    }

    /// First entry in execution order.
    pub fn peek(&self) -> Option<ScheduledTask> {
        self.lock().order.values().next().cloned()
    }

    /// Remaining delay and name of the entry scheduled soonest.
    pub fn soonest(&self, now: Instant) -> Option<(Duration, String)> {
        self.lock()
            .order
            .values()
            .min_by_key(|t| t.scheduled_at())
            .map(|t| (t.remaining(now), t.name()))
    }

    /// Removes the entry with the given identity.
    pub fn remove(&self, id: &TaskIdentity) -> Option<ScheduledTask> {
        self.lock().take(id)
    }

    pub fn contains(&self, id: &TaskIdentity) -> bool {
        self.lock().index.contains_key(id)
    }

    /// Copy of the entry with the given identity.
    pub fn get(&self, id: &TaskIdentity) -> Option<ScheduledTask> {
        let state = self.lock();
        let key = state.index.get(id)?;
        state.order.get(key).cloned()
    }

    /// Moves an equal queued entry to `now` and makes it recurring, or
    /// inserts `prototype` one-shot at `now`.
    pub(crate) fn force_now(&self, prototype: ScheduledTask, now: Instant) -> Forced {
        let mut state = self.lock();
        match state.take(prototype.identity()) {
            Some(mut queued) => {
                queued.reschedule(now);
                queued.set_recurring(true);
                state.insert(queued);
                Forced::Moved
            }
            None => {
                state.insert(prototype.at(now).one_shot());
                Forced::Inserted
            }
        }
    }

    /// Moves a queued entry up to `at`, keeping its recurrence, or inserts
    /// the prototype one-shot at `at`. An entry already due by `at` is left
    /// alone.
    pub(crate) fn bring_forward(&self, prototype: ScheduledTask, at: Instant) -> Forced {
        let mut state = self.lock();
        match state.take(prototype.identity()) {
            Some(queued) if queued.is_due(at) => {
                state.insert(queued);
                Forced::AlreadyDue
            }
            Some(mut queued) => {
                queued.reschedule(at);
                state.insert(queued);
                Forced::Moved
            }
            None => {
                state.insert(prototype.at(at).one_shot());
                Forced::Inserted
            }
        }
    }

    /// Drops every entry.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.order.clear();
        state.index.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().order.is_empty()
    }

    /// Entries in execution order.
    pub fn snapshot(&self) -> Vec<ScheduledTask> {
        self.lock().order.values().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfileId;
    use crate::tasks::TaskKind;
    use crate::test_support::noop_task;

    fn entry(kind: TaskKind, key: Option<&str>, at: Instant) -> ScheduledTask {
        ScheduledTask::new(noop_task(kind, key), ProfileId::from("main")).at(at)
    }

    #[test]
    fn orders_by_delay_with_initialize_first() {
        let base = Instant::now();
        let q = TaskQueue::new();
        q.push(entry(TaskKind::Arena, None, base + Duration::from_secs(30)));
        q.push(entry(TaskKind::Gather, Some("wood"), base + Duration::from_secs(10)));
        q.push(entry(TaskKind::Initialize, None, base + Duration::from_secs(60)));
        q.push(entry(TaskKind::HealInjured, None, base + Duration::from_secs(20)));

        let kinds: Vec<_> = q.snapshot().iter().map(|t| t.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                TaskKind::Initialize,
                TaskKind::Gather,
                TaskKind::HealInjured,
                TaskKind::Arena
            ]
        );
    }

    #[test]
    fn ties_break_by_insertion() {
        let at = Instant::now();
        let q = TaskQueue::new();
        q.push(entry(TaskKind::Gather, Some("iron"), at));
        q.push(entry(TaskKind::Gather, Some("wood"), at));
        let names: Vec<_> = q.snapshot().iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["Gather Resources (iron)", "Gather Resources (wood)"]);
    }

    #[test]
    fn push_replaces_equal_entry() {
        let base = Instant::now();
        let q = TaskQueue::new();
        q.push(entry(TaskKind::Arena, None, base));
        let replaced = q.push(entry(TaskKind::Arena, None, base + Duration::from_secs(5)));
        assert!(replaced.is_some());
        assert_eq!(q.len(), 1);
        assert_eq!(
            q.peek().expect("entry").scheduled_at(),
            base + Duration::from_secs(5)
        );
    }

    #[test]
    fn pop_due_skips_future_initialize() {
        let base = Instant::now();
        let q = TaskQueue::new();
        q.push(entry(TaskKind::Initialize, None, base + Duration::from_secs(60)));
        q.push(entry(TaskKind::Arena, None, base));

        let popped = q.pop_due(base).expect("arena due");
        assert_eq!(popped.kind(), TaskKind::Arena);
        assert!(q.pop_due(base).is_none());
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn merge_keeps_earliest_and_recurring() {
        let base = Instant::now();
        let q = TaskQueue::new();
        q.push(entry(TaskKind::Arena, None, base).one_shot());

        let executed = entry(TaskKind::Arena, None, base + Duration::from_secs(600));
        q.merge(executed);

        let merged = q.peek().expect("entry");
        assert_eq!(merged.scheduled_at(), base);
        assert!(merged.is_recurring());
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn force_now_never_grows_the_queue() {
        let base = Instant::now();
        let q = TaskQueue::new();
        q.push(entry(TaskKind::Arena, None, base + Duration::from_secs(3600)).one_shot());

        let proto = entry(TaskKind::Arena, None, base);
        assert_eq!(q.force_now(proto, base), Forced::Moved);
        assert_eq!(q.len(), 1);
        let moved = q.peek().expect("entry");
        assert_eq!(moved.scheduled_at(), base);
        assert!(moved.is_recurring());

        let fresh = entry(TaskKind::HealInjured, None, base + Duration::from_secs(99));
        assert_eq!(q.force_now(fresh, base), Forced::Inserted);
        let heal = q.get(&entry(TaskKind::HealInjured, None, base).identity().clone());
        let heal = heal.expect("inserted");
        assert!(!heal.is_recurring());
        assert_eq!(heal.scheduled_at(), base);
    }

    #[test]
    fn bring_forward_keeps_recurrence_and_skips_due_entries() {
        let base = Instant::now();
        let q = TaskQueue::new();
        q.push(entry(TaskKind::DailyMissions, None, base).one_shot());
        let proto = entry(TaskKind::DailyMissions, None, base);
        assert_eq!(
            q.bring_forward(proto.clone(), base + Duration::from_secs(1)),
            Forced::AlreadyDue
        );
        assert!(!q.peek().expect("entry").is_recurring());

        q.push(entry(TaskKind::Initialize, None, base + Duration::from_secs(600)).one_shot());
        let init = entry(TaskKind::Initialize, None, base);
        assert_eq!(q.bring_forward(init, base), Forced::Moved);
        let moved = q.peek().expect("initialize first");
        assert_eq!(moved.kind(), TaskKind::Initialize);
        assert_eq!(moved.scheduled_at(), base);
        assert!(!moved.is_recurring());
    }

    #[test]
    fn bring_forward_to_a_later_instant() {
        let base = Instant::now();
        let later = base + Duration::from_secs(10);
        let q = TaskQueue::new();
        let init = entry(TaskKind::Initialize, None, base);
        assert_eq!(q.bring_forward(init.clone(), later), Forced::Inserted);
        assert_eq!(q.peek().expect("queued").scheduled_at(), later);
        assert!(q.pop_due(base).is_none());

        // Already due by the target: untouched.
        assert_eq!(q.bring_forward(init, later + Duration::from_secs(5)), Forced::AlreadyDue);
        assert_eq!(q.peek().expect("queued").scheduled_at(), later);
    }

    #[test]
    fn soonest_looks_past_initialize() {
        let base = Instant::now();
        let q = TaskQueue::new();
        assert!(q.soonest(base).is_none());
        q.push(entry(TaskKind::Initialize, None, base + Duration::from_secs(60)));
        q.push(entry(TaskKind::Arena, None, base + Duration::from_secs(5)));
        let (delay, name) = q.soonest(base).expect("non-empty");
        assert_eq!(delay, Duration::from_secs(5));
        assert_eq!(name, "Arena");
    }

    #[test]
    fn remove_and_clear() {
        let base = Instant::now();
        let q = TaskQueue::new();
        let arena = entry(TaskKind::Arena, None, base);
        let id = arena.identity().clone();
        q.push(arena);
        q.push(entry(TaskKind::Gather, Some("wood"), base));
        assert!(q.contains(&id));
        assert!(q.remove(&id).is_some());
        assert!(!q.contains(&id));
        q.clear();
        assert!(q.is_empty());
    }
}
