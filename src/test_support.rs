//! Test doubles shared by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::emulator::EmulatorControl;
use crate::error::TaskError;
use crate::profile::ProfileId;
use crate::slots::FifoSlotPool;
use crate::tasks::{Task, TaskContext, TaskFn, TaskKind, TaskRef};

/// Task that does nothing.
pub(crate) fn noop_task(kind: TaskKind, key: Option<&str>) -> TaskRef {
    let f = |_ctx: TaskContext| async { Ok::<_, TaskError>(()) };
    match key {
        Some(key) => TaskFn::keyed(kind, key.to_string(), f),
        None => TaskFn::arc(kind, f),
    }
}

/// Task that counts its runs, optionally reschedules itself, fails once on
/// demand and appends its kind to a shared log.
pub(crate) struct ScriptedTask {
    kind: TaskKind,
    key: Option<String>,
    runs: AtomicUsize,
    every: Option<Duration>,
    fail_next: Mutex<Option<TaskError>>,
    log: Option<Arc<Mutex<Vec<TaskKind>>>>,
}

impl ScriptedTask {
    pub(crate) fn new(kind: TaskKind) -> Self {
        Self {
            kind,
            key: None,
            runs: AtomicUsize::new(0),
            every: None,
            fail_next: Mutex::new(None),
            log: None,
        }
    }

    pub(crate) fn keyed(mut self, key: &str) -> Self {
        self.key = Some(key.to_string());
        self
    }

    /// Reschedules itself `every` from now after each successful run.
    pub(crate) fn every(mut self, every: Duration) -> Self {
        self.every = Some(every);
        self
    }

    /// Fails the next run with `err`.
    pub(crate) fn fail_once(self, err: TaskError) -> Self {
        *self.fail_next.lock().unwrap() = Some(err);
        self
    }

    pub(crate) fn logging(mut self, log: Arc<Mutex<Vec<TaskKind>>>) -> Self {
        self.log = Some(log);
        self
    }

    pub(crate) fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Task for ScriptedTask {
    fn kind(&self) -> TaskKind {
        self.kind
    }

    fn distinct_key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    async fn execute(&self, ctx: TaskContext) -> Result<(), TaskError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if let Some(log) = &self.log {
            log.lock().unwrap().push(self.kind);
        }
        if let Some(err) = self.fail_next.lock().unwrap().take() {
            return Err(err);
        }
        if let Some(every) = self.every {
            ctx.reschedule_in(every);
        }
        Ok(())
    }
}

/// Emulator double counting every call.
///
/// When watching a slot pool it also counts prompt dismissals made without
/// the profile holding a slot.
#[derive(Default)]
pub(crate) struct RecordingEmulator {
    pub closes: AtomicUsize,
    pub dismissals: AtomicUsize,
    pub helps: AtomicUsize,
    pub unslotted: AtomicUsize,
    slots: Option<Arc<FifoSlotPool>>,
}

impl RecordingEmulator {
    pub(crate) fn watching(slots: Arc<FifoSlotPool>) -> Self {
        Self {
            slots: Some(slots),
            ..Self::default()
        }
    }

    pub(crate) fn unslotted(&self) -> usize {
        self.unslotted.load(Ordering::SeqCst)
    }

    pub(crate) fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub(crate) fn dismissals(&self) -> usize {
        self.dismissals.load(Ordering::SeqCst)
    }

    pub(crate) fn helps(&self) -> usize {
        self.helps.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmulatorControl for RecordingEmulator {
    async fn close(&self, _profile: &ProfileId) -> Result<(), TaskError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn dismiss_reconnect_prompt(&self, profile: &ProfileId) -> Result<(), TaskError> {
        self.dismissals.fetch_add(1, Ordering::SeqCst);
        if self.slots.as_ref().is_some_and(|slots| !slots.is_held(profile)) {
            self.unslotted.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn request_alliance_help(&self, _profile: &ProfileId) -> Result<bool, TaskError> {
        self.helps.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}
