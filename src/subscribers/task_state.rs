//! # Per-task state mirror with sequence-based ordering.
//!
//! [`TaskStateMirror`] keeps the externally visible state of each task
//! (scheduled, executing, last/next execution) so a UI can render it without
//! touching the scheduler queues.
//!
//! ## Architecture
//! ```text
//! Scheduler ──► Bus ──► SubscriberSet ──► TaskStateMirror::apply()
//!                                                  │
//!                                                  ▼
//!                                 HashMap<(profile, TaskKind), TaskState>
//! ```
//!
//! ## Rules
//! - Entries are keyed by profile and task kind; distinct keys of the same
//!   kind share one entry, which stays `scheduled` while any of them is queued
//! - Events with `seq <= last_seq` for that entry are **rejected** (stale)
//! - `SchedulerStopped` drops every entry of the profile

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;
use crate::tasks::TaskKind;

/// Externally visible state of one task kind on one profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskState {
    /// Sitting in the queue.
    pub scheduled: bool,
    /// Currently executing.
    pub executing: bool,
    /// Start of the last execution.
    pub last_execution: Option<SystemTime>,
    /// Next planned execution.
    pub next_execution: Option<SystemTime>,
    /// Names of the queued tasks of this kind.
    queued: HashSet<Arc<str>>,
    /// Name of the executing task of this kind.
    running: Option<Arc<str>>,
    last_seq: u64,
}

type Key = (Arc<str>, TaskKind);

/// Thread-safe mirror of task states, fed by scheduler events.
#[derive(Debug, Default)]
pub struct TaskStateMirror {
    state: RwLock<HashMap<Key, TaskState>>,
}

impl TaskStateMirror {
    /// Creates an empty mirror.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies an event; returns `true` if it changed a task state.
    ///
    /// ```text
    /// apply(TaskStarting, seq=100)  → executing=true, last_seq=100
    /// apply(TaskScheduled, seq=99)  → rejected (stale)
    /// ```
    pub fn apply(&self, ev: &Event) -> bool {
        let Some(profile) = ev.profile.as_ref() else {
            return false;
        };
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        if ev.kind == EventKind::SchedulerStopped {
            let before = state.len();
            state.retain(|(p, _), _| p != profile);
            return state.len() != before;
        }

        let Some(kind) = ev.task_kind else {
            return false;
        };
        if !matches!(
            ev.kind,
            EventKind::TaskScheduled
                | EventKind::TaskStarting
                | EventKind::TaskDropped
                | EventKind::TaskRemoved
        ) {
            return false;
        }

        let entry = state.entry((Arc::clone(profile), kind)).or_default();
        if ev.seq <= entry.last_seq {
            return false;
        }
        entry.last_seq = ev.seq;

        let name = ev
            .task
            .clone()
            .unwrap_or_else(|| Arc::from(kind.display_name()));
        let was_running = entry.running.as_ref() == Some(&name);
        match ev.kind {
            EventKind::TaskScheduled => {
                entry.queued.insert(name);
                if was_running {
                    entry.running = None;
                }
                entry.next_execution = ev.next_run;
                if ev.last_run.is_some() {
                    entry.last_execution = ev.last_run;
                }
            }
            EventKind::TaskStarting => {
                entry.queued.remove(&name);
                entry.running = Some(name);
                if ev.last_run.is_some() {
                    entry.last_execution = ev.last_run;
                }
            }
            _ => {
                entry.queued.remove(&name);
                if was_running {
                    entry.running = None;
                }
                if entry.queued.is_empty() {
                    entry.next_execution = None;
                }
            }
        }
        entry.scheduled = !entry.queued.is_empty();
        entry.executing = entry.running.is_some();
        true
    }

    /// Current state of a task kind on a profile.
    pub fn get(&self, profile: &str, kind: TaskKind) -> Option<TaskState> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.get(&(Arc::from(profile), kind)).cloned()
    }

    /// All states of one profile, sorted by kind.
    pub fn snapshot(&self, profile: &str) -> Vec<(TaskKind, TaskState)> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let mut out: Vec<_> = state
            .iter()
            .filter(|((p, _), _)| p.as_ref() == profile)
            .map(|((_, k), s)| (*k, s.clone()))
            .collect();
        out.sort_by_key(|(k, _)| *k);
        out
    }
}

#[async_trait]
impl Subscribe for TaskStateMirror {
    async fn on_event(&self, event: &Event) {
        self.apply(event);
    }

    fn name(&self) -> &'static str {
        "task_state"
    }
}
