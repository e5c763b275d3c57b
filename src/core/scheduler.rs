//! # Per-profile scheduler.
//!
//! A [`Scheduler`] owns one profile's task queue and a dedicated worker that
//! executes due tasks one at a time, classifies failures into recoveries,
//! re-enqueues recurring tasks and moves the profile in and out of idle mode.
//!
//! ## Lifecycle
//! ```text
//! STOPPED ──start()──► RUNNING ──pause()──► PAUSED
//!    ▲                    │  ◄──resume()──────┘
//!    └──────stop()────────┴───────────────────┘
//! ```
//!
//! ## Rules
//! - `start()` is a no-op while running and never fails; problems surface as
//!   events and logs
//! - `pause()`/`resume()` are idempotent; events only on real transitions
//! - `stop()` is idempotent, joins the worker with a bounded timeout and always
//!   leaves the scheduler clean (queue empty, slot released, flags reset)
//! - Task failures never escape the worker

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::{SchedulerConfig, SchedulerHandle, queue::TaskQueue, reconnect::ReconnectTimer};
use crate::emulator::EmulatorControl;
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::profile::ProfileId;
use crate::settings::ProfileSettings;
use crate::slots::SlotPool;
use crate::tasks::{ScheduledTask, TaskFactory, TaskIdentity, TaskKind};

use super::{helper, worker};

/// Spawned background work of a running scheduler.
struct Running {
    token: CancellationToken,
    worker: JoinHandle<()>,
    helper: Option<JoinHandle<()>>,
}

/// Scheduler for a single profile.
///
/// Built with [`SchedulerBuilder`](crate::SchedulerBuilder) and used as
/// `Arc<Scheduler>`.
pub struct Scheduler {
    pub(super) profile: ProfileId,
    pub(super) cfg: SchedulerConfig,
    pub(super) settings: Arc<dyn ProfileSettings>,
    pub(super) factory: Arc<dyn TaskFactory>,
    pub(super) slots: Arc<dyn SlotPool>,
    pub(super) emulator: Arc<dyn EmulatorControl>,
    pub(super) bus: Bus,
    pub(super) queue: TaskQueue,
    pub(super) reconnect: ReconnectTimer,
    /// Held while a task or the help check drives the emulator.
    pub(super) emulator_lock: tokio::sync::Mutex<()>,

    running: AtomicBool,
    paused: AtomicBool,
    idling: AtomicBool,
    slot_held: AtomicBool,
    /// Consecutive failed initializations.
    init_strikes: AtomicU32,
    spawned: Mutex<Option<Running>>,
}

impl Scheduler {
    pub(crate) fn new_internal(
        profile: ProfileId,
        cfg: SchedulerConfig,
        settings: Arc<dyn ProfileSettings>,
        factory: Arc<dyn TaskFactory>,
        slots: Arc<dyn SlotPool>,
        emulator: Arc<dyn EmulatorControl>,
        bus: Bus,
    ) -> Self {
        Self {
            profile,
            cfg,
            settings,
            factory,
            slots,
            emulator,
            bus,
            queue: TaskQueue::new(),
            reconnect: ReconnectTimer::new(),
            emulator_lock: tokio::sync::Mutex::new(()),
            running: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            idling: AtomicBool::new(false),
            slot_held: AtomicBool::new(false),
            init_strikes: AtomicU32::new(0),
            spawned: Mutex::new(None),
        }
    }

    /// Starts the worker (and the alliance-help ticker).
    ///
    /// No-op when already running. Must be called inside a tokio runtime.
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!(profile = %self.profile, "start ignored: already running");
            return;
        }
        let token = CancellationToken::new();
        let worker = tokio::spawn(worker::run(Arc::downgrade(self), token.clone()));
        let helper = self
            .cfg
            .help_period()
            .map(|period| tokio::spawn(helper::run(Arc::downgrade(self), period, token.clone())));

        *self.spawned() = Some(Running {
            token,
            worker,
            helper,
        });
        info!(profile = %self.profile, "scheduler started");
        self.publish(Event::new(EventKind::SchedulerStarted));
    }

    /// Stops the worker and clears all scheduling state.
    ///
    /// Returns [`RuntimeError::JoinTimeout`] if the worker did not finish
    /// within the join timeout; it is aborted and the state cleared anyway.
    pub async fn stop(&self) -> Result<(), RuntimeError> {
        let was_running = self.running.swap(false, Ordering::SeqCst);

        let spawned = self.spawned().take();
        let mut result = Ok(());
        if let Some(Running {
            token,
            mut worker,
            helper,
        }) = spawned
        {
            token.cancel();
            if time::timeout(self.cfg.join_timeout, &mut worker).await.is_err() {
                worker.abort();
                warn!(profile = %self.profile, timeout = ?self.cfg.join_timeout, "worker did not stop in time; aborted");
                result = Err(RuntimeError::JoinTimeout {
                    profile: self.profile.to_string(),
                    timeout: self.cfg.join_timeout,
                });
            }
            if let Some(helper) = helper {
                helper.abort();
            }
        }

        self.reconnect.cancel();
        self.release_slot();
        self.queue.clear();
        self.paused.store(false, Ordering::SeqCst);
        self.idling.store(false, Ordering::SeqCst);
        self.init_strikes.store(0, Ordering::SeqCst);

        if was_running {
            info!(profile = %self.profile, "scheduler stopped");
            self.publish_status("Not running");
            self.publish(Event::new(EventKind::SchedulerStopped));
        }
        result
    }

    /// Suspends task execution; the queue is preserved.
    pub fn pause(&self) {
        self.pause_with(None);
    }

    pub(super) fn pause_with(&self, reason: Option<&str>) {
        if !self.paused.swap(true, Ordering::SeqCst) {
            let mut ev = Event::new(EventKind::Paused);
            if let Some(reason) = reason {
                ev = ev.with_reason(reason);
            }
            self.publish(ev);
        }
    }

    /// Resumes task execution.
    pub fn resume(&self) {
        if self.paused.swap(false, Ordering::SeqCst) {
            self.publish(Event::new(EventKind::Resumed));
        }
    }

    /// Runs a task as soon as possible.
    ///
    /// An equal queued entry is moved to now and becomes recurring; otherwise
    /// a fresh task from the factory is inserted one-shot.
    pub fn execute_task_now(
        &self,
        kind: TaskKind,
        distinct_key: Option<&str>,
    ) -> Result<(), RuntimeError> {
        let task = self.factory.create(kind, &self.profile, distinct_key)?;
        let proto = ScheduledTask::new(task, self.profile.clone());
        let id = proto.identity().clone();
        self.queue.force_now(proto, Instant::now());
        self.publish_scheduled(&id);
        Ok(())
    }

    /// Creates a task through the factory and queues it (recurring) at `at`.
    ///
    /// Replaces an equal queued entry.
    pub fn add_task(
        &self,
        kind: TaskKind,
        distinct_key: Option<&str>,
        at: Instant,
    ) -> Result<(), RuntimeError> {
        let task = self.factory.create(kind, &self.profile, distinct_key)?;
        self.enqueue(ScheduledTask::new(task, self.profile.clone()).at(at));
        Ok(())
    }

    /// Removes a queued task; returns whether one was removed.
    pub fn remove_task(&self, kind: TaskKind, distinct_key: Option<&str>) -> bool {
        let id = self.identity(kind, distinct_key);
        match self.queue.remove(&id) {
            Some(entry) => {
                self.publish(
                    Event::new(EventKind::TaskRemoved).with_task(entry.name(), entry.kind()),
                );
                true
            }
            None => false,
        }
    }

    /// True if an entry with this identity is queued.
    pub fn is_task_scheduled(&self, kind: TaskKind, distinct_key: Option<&str>) -> bool {
        self.queue.contains(&self.identity(kind, distinct_key))
    }

    /// Inserts an entry, replacing an equal one.
    ///
    /// Entries owned by another profile are rejected and `false` is returned.
    pub fn enqueue(&self, entry: ScheduledTask) -> bool {
        if entry.profile() != &self.profile {
            warn!(
                profile = %self.profile,
                owner = %entry.profile(),
                task = %entry.name(),
                "rejected task owned by another profile"
            );
            return false;
        }
        let id = entry.identity().clone();
        self.queue.push(entry);
        self.publish_scheduled(&id);
        true
    }

    /// Queue entries in execution order.
    pub fn queued(&self) -> Vec<ScheduledTask> {
        self.queue.snapshot()
    }

    /// Profile this scheduler drives.
    pub fn profile(&self) -> &ProfileId {
        &self.profile
    }

    /// Shared event bus.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Restricted handle for tasks and callbacks.
    pub fn handle(self: &Arc<Self>) -> SchedulerHandle {
        SchedulerHandle::new(Arc::downgrade(self))
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// True while the emulator is closed and the slot given back.
    pub fn is_idling(&self) -> bool {
        self.idling.load(Ordering::SeqCst)
    }

    /// When an armed reconnect is due, while paused after a disconnect.
    pub fn reconnect_at(&self) -> Option<Instant> {
        self.reconnect.deadline()
    }

    /// True while the profile holds a slot.
    pub fn holds_slot(&self) -> bool {
        self.slot_held.load(Ordering::SeqCst)
    }

    pub(super) fn set_idling(&self, idling: bool) {
        self.idling.store(idling, Ordering::SeqCst);
    }

    /// Counts a failed initialization; returns the strikes before it.
    pub(super) fn strike_init(&self) -> u32 {
        self.init_strikes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_add(1)))
            .unwrap_or_else(|n| n)
    }

    pub(super) fn reset_init_strikes(&self) {
        self.init_strikes.store(0, Ordering::SeqCst);
    }

    pub(super) fn mark_slot_held(&self) {
        self.slot_held.store(true, Ordering::SeqCst);
    }

    /// Gives the slot back if held.
    pub(super) fn release_slot(&self) {
        if self.slot_held.swap(false, Ordering::SeqCst) {
            self.slots.release(&self.profile);
            self.publish(Event::new(EventKind::SlotReleased));
        }
    }

    pub(super) fn identity(&self, kind: TaskKind, distinct_key: Option<&str>) -> TaskIdentity {
        TaskIdentity::new(kind, self.profile.clone(), distinct_key)
    }

    /// Publishes a "scheduled, not executing" record for a queued identity.
    pub(super) fn publish_scheduled(&self, id: &TaskIdentity) {
        if let Some(entry) = self.queue.get(id) {
            self.publish(
                Event::new(EventKind::TaskScheduled)
                    .with_task(entry.name(), entry.kind())
                    .with_next_run(entry.scheduled_at())
                    .with_last_run(entry.last_executed_at()),
            );
        }
    }

    pub(super) fn publish_status(&self, status: impl Into<Arc<str>>) {
        self.publish(Event::new(EventKind::Status).with_status(status));
    }

    /// Publishes an event tagged with this profile.
    pub(super) fn publish(&self, ev: Event) {
        self.bus.publish(ev.with_profile(self.profile.as_arc()));
    }

    fn spawned(&self) -> MutexGuard<'_, Option<Running>> {
        self.spawned.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
