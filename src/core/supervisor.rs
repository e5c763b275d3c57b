//! # Supervisor: registry of profile schedulers, fan-out delivery and graceful shutdown.
//!
//! The [`Supervisor`] owns the shared event bus, the slot pool every profile
//! competes for, and a [`SubscriberSet`] fed from the bus. Profiles are added
//! with their live settings; each gets its own [`Scheduler`].
//!
//! ## Architecture
//! ```text
//! add_profile("main", settings) ──► Scheduler(main) ─┐
//! add_profile("alt",  settings) ──► Scheduler(alt)  ─┼─► Bus ─► listener ─► SubscriberSet::emit
//!                                          │          │
//!                                          └── shared SlotPool
//!
//! Shutdown path (run()):
//!   shutdown::wait_for_shutdown_signal()
//!             └─► Bus.publish(ShutdownRequested)
//!             └─► stop_all() within cfg.grace:
//!                    ├─ all stopped      → Bus.publish(AllStoppedWithin)
//!                    └─ grace exceeded   → Bus.publish(GraceExceeded) + stuck profiles
//! ```
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use profilevisor::{
//!     FifoSlotPool, LogWriter, MemorySettings, Subscribe, SupervisorBuilder, TaskTable,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let table = Arc::new(TaskTable::new());
//!     let sup = SupervisorBuilder::new(table)
//!         .with_slot_pool(Arc::new(FifoSlotPool::new(2)))
//!         .with_subscribers(vec![Arc::new(LogWriter) as Arc<dyn Subscribe>])
//!         .build();
//!
//!     sup.add_profile("main", Arc::new(MemorySettings::new()))?;
//!     sup.add_profile("alt", Arc::new(MemorySettings::new()))?;
//!     sup.run().await?;
//!     Ok(())
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::core::{SchedulerBuilder, Scheduler, SupervisorConfig, shutdown};
use crate::emulator::EmulatorControl;
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::profile::ProfileId;
use crate::settings::ProfileSettings;
use crate::slots::SlotPool;
use crate::subscribers::SubscriberSet;
use crate::tasks::TaskFactory;

/// Coordinates per-profile schedulers, event delivery and graceful shutdown.
pub struct Supervisor {
    cfg: SupervisorConfig,
    bus: Bus,
    factory: Arc<dyn TaskFactory>,
    slots: Arc<dyn SlotPool>,
    emulator: Arc<dyn EmulatorControl>,
    schedulers: RwLock<HashMap<ProfileId, Arc<Scheduler>>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl Supervisor {
    pub(crate) fn new_internal(
        cfg: SupervisorConfig,
        bus: Bus,
        factory: Arc<dyn TaskFactory>,
        slots: Arc<dyn SlotPool>,
        emulator: Arc<dyn EmulatorControl>,
    ) -> Self {
        Self {
            cfg,
            bus,
            factory,
            slots,
            emulator,
            schedulers: RwLock::new(HashMap::new()),
            listener: Mutex::new(None),
        }
    }

    /// Subscribes to the bus and forwards events to the subscriber set (fire-and-forget).
    pub(crate) fn forward_events(&self, subs: SubscriberSet) {
        if subs.is_empty() {
            return;
        }
        let mut rx = self.bus.subscribe();
        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => subs.emit(&ev),
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "event listener lagged");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            subs.shutdown().await;
        });
        *self.listener.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
    }

    /// Registers a profile and returns its (not yet started) scheduler.
    pub fn add_profile(
        &self,
        profile: impl Into<ProfileId>,
        settings: Arc<dyn ProfileSettings>,
    ) -> Result<Arc<Scheduler>, RuntimeError> {
        let profile = profile.into();
        let mut map = self.write();
        if map.contains_key(&profile) {
            return Err(RuntimeError::ProfileExists {
                profile: profile.to_string(),
            });
        }
        let scheduler = SchedulerBuilder::new(profile.clone(), Arc::clone(&self.factory))
            .with_config(self.cfg.scheduler.clone())
            .with_settings(settings)
            .with_slot_pool(Arc::clone(&self.slots))
            .with_emulator(Arc::clone(&self.emulator))
            .with_bus(self.bus.clone())
            .build();
        map.insert(profile, Arc::clone(&scheduler));
        Ok(scheduler)
    }

    /// Stops and unregisters a profile.
    pub async fn remove_profile(&self, profile: &str) -> Result<(), RuntimeError> {
        let removed = self.write().remove(&ProfileId::from(profile));
        match removed {
            Some(scheduler) => scheduler.stop().await,
            None => Err(RuntimeError::ProfileNotFound {
                profile: profile.to_string(),
            }),
        }
    }

    /// Scheduler of a profile.
    pub fn get(&self, profile: &str) -> Option<Arc<Scheduler>> {
        self.read().get(&ProfileId::from(profile)).cloned()
    }

    /// Registered profiles, sorted.
    pub fn profiles(&self) -> Vec<ProfileId> {
        let mut out: Vec<_> = self.read().keys().cloned().collect();
        out.sort();
        out
    }

    /// Shared event bus.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Starts every registered scheduler.
    pub fn start_all(&self) {
        for scheduler in self.all() {
            scheduler.start();
        }
    }

    /// Stops every scheduler concurrently within the grace period.
    ///
    /// Returns [`RuntimeError::GraceExceeded`] listing profiles that did not
    /// stop cleanly in time.
    pub async fn stop_all(&self) -> Result<(), RuntimeError> {
        let grace = self.cfg.grace;
        let schedulers = self.all();
        let clean = Mutex::new(HashSet::new());

        let stops = schedulers.iter().map(|s| {
            let clean = &clean;
            async move {
                if s.stop().await.is_ok() {
                    clean
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .insert(s.profile().clone());
                }
            }
        });
        let _ = tokio::time::timeout(grace, join_all(stops)).await;

        let clean = clean.into_inner().unwrap_or_else(PoisonError::into_inner);
        let mut stuck: Vec<String> = schedulers
            .iter()
            .filter(|s| !clean.contains(s.profile()))
            .map(|s| s.profile().to_string())
            .collect();
        stuck.sort_unstable();

        if stuck.is_empty() {
            info!(profiles = schedulers.len(), "all schedulers stopped");
            self.bus.publish(Event::new(EventKind::AllStoppedWithin));
            Ok(())
        } else {
            warn!(?stuck, ?grace, "schedulers did not stop in time");
            self.bus.publish(
                Event::new(EventKind::GraceExceeded).with_reason(stuck.join(",")),
            );
            Err(RuntimeError::GraceExceeded { grace, stuck })
        }
    }

    /// Starts all schedulers and runs until a termination signal arrives,
    /// then stops them within the grace period.
    pub async fn run(&self) -> Result<(), RuntimeError> {
        self.start_all();
        if let Err(err) = shutdown::wait_for_shutdown_signal().await {
            warn!(error = %err, "signal registration failed; shutting down");
        }
        self.shutdown().await
    }

    /// Publishes `ShutdownRequested` and stops everything.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        info!("shutdown requested");
        self.bus.publish(Event::new(EventKind::ShutdownRequested));
        self.stop_all().await
    }

    fn all(&self) -> Vec<Arc<Scheduler>> {
        self.read().values().cloned().collect()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<ProfileId, Arc<Scheduler>>> {
        self.schedulers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<ProfileId, Arc<Scheduler>>> {
        self.schedulers.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        if let Some(handle) = self
            .listener
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}
