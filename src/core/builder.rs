use std::sync::Arc;

use crate::{
    core::{Scheduler, SchedulerConfig, Supervisor, SupervisorConfig},
    emulator::{DetachedEmulator, EmulatorControl},
    events::Bus,
    profile::ProfileId,
    settings::{MemorySettings, ProfileSettings},
    slots::{FifoSlotPool, SlotPool},
    subscribers::{Subscribe, SubscriberSet},
    tasks::TaskFactory,
};

/// Builder for a standalone [`Scheduler`].
///
/// Collaborators not provided fall back to: empty [`MemorySettings`], a
/// private single-slot [`FifoSlotPool`], a [`DetachedEmulator`] and a private
/// [`Bus`].
pub struct SchedulerBuilder {
    profile: ProfileId,
    factory: Arc<dyn TaskFactory>,
    cfg: SchedulerConfig,
    settings: Option<Arc<dyn ProfileSettings>>,
    slots: Option<Arc<dyn SlotPool>>,
    emulator: Option<Arc<dyn EmulatorControl>>,
    bus: Option<Bus>,
}

impl SchedulerBuilder {
    /// Creates a builder for `profile` creating tasks through `factory`.
    pub fn new(profile: impl Into<ProfileId>, factory: Arc<dyn TaskFactory>) -> Self {
        Self {
            profile: profile.into(),
            factory,
            cfg: SchedulerConfig::default(),
            settings: None,
            slots: None,
            emulator: None,
            bus: None,
        }
    }

    pub fn with_config(mut self, cfg: SchedulerConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Live settings of the profile.
    pub fn with_settings(mut self, settings: Arc<dyn ProfileSettings>) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Slot pool shared with other profiles.
    pub fn with_slot_pool(mut self, slots: Arc<dyn SlotPool>) -> Self {
        self.slots = Some(slots);
        self
    }

    pub fn with_emulator(mut self, emulator: Arc<dyn EmulatorControl>) -> Self {
        self.emulator = Some(emulator);
        self
    }

    /// Event bus to publish on (shared with a supervisor or UI).
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Builds the scheduler. It does not start until [`Scheduler::start`].
    pub fn build(self) -> Arc<Scheduler> {
        let bus = self
            .bus
            .unwrap_or_else(|| Bus::new(self.cfg.bus_capacity_clamped()));
        Arc::new(Scheduler::new_internal(
            self.profile,
            self.cfg,
            self.settings
                .unwrap_or_else(|| Arc::new(MemorySettings::new())),
            self.factory,
            self.slots.unwrap_or_else(|| Arc::new(FifoSlotPool::new(1))),
            self.emulator.unwrap_or_else(|| Arc::new(DetachedEmulator)),
            bus,
        ))
    }
}

/// Builder for a [`Supervisor`] managing several profiles.
pub struct SupervisorBuilder {
    cfg: SupervisorConfig,
    factory: Arc<dyn TaskFactory>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    slots: Option<Arc<dyn SlotPool>>,
    emulator: Option<Arc<dyn EmulatorControl>>,
}

impl SupervisorBuilder {
    /// Creates a builder; every profile creates its tasks through `factory`.
    pub fn new(factory: Arc<dyn TaskFactory>) -> Self {
        Self {
            cfg: SupervisorConfig::default(),
            factory,
            subscribers: Vec::new(),
            slots: None,
            emulator: None,
        }
    }

    pub fn with_config(mut self, cfg: SupervisorConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets event subscribers.
    ///
    /// Subscribers receive every event of every profile through dedicated
    /// workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Slot pool shared by all profiles (default: one slot).
    pub fn with_slot_pool(mut self, slots: Arc<dyn SlotPool>) -> Self {
        self.slots = Some(slots);
        self
    }

    pub fn with_emulator(mut self, emulator: Arc<dyn EmulatorControl>) -> Self {
        self.emulator = Some(emulator);
        self
    }

    /// Builds the supervisor and starts forwarding events to subscribers.
    ///
    /// Must be called inside a tokio runtime.
    pub fn build(self) -> Arc<Supervisor> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = SubscriberSet::new(self.subscribers, bus.clone());
        let slots = self
            .slots
            .unwrap_or_else(|| Arc::new(FifoSlotPool::new(1)));
        let emulator = self.emulator.unwrap_or_else(|| Arc::new(DetachedEmulator));

        let sup = Arc::new(Supervisor::new_internal(
            self.cfg,
            bus,
            self.factory,
            slots,
            emulator,
        ));
        sup.forward_events(subs);
        sup
    }
}
