//! # profilevisor
//!
//! **Profilevisor** is the task scheduling and recovery engine for
//! long-running, per-profile automation sessions against emulated game
//! clients.
//!
//! Every profile owns one [`Scheduler`]: a priority queue of
//! [`ScheduledTask`]s drained by a single worker. Tasks reschedule
//! themselves; the worker re-queues recurring entries, classifies failures
//! into recoveries, idles the profile (closing its emulator and releasing
//! its slot) when nothing is due for a while, and pauses it across
//! disconnects. A [`Supervisor`] hosts many profiles that compete for a
//! shared [`SlotPool`].
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//!     │ ProfileId     │   │ ProfileId     │   │ ProfileId     │
//!     │ + settings    │   │ + settings    │   │ + settings    │
//!     └──────┬────────┘   └──────┬────────┘   └──────┬────────┘
//!            ▼                   ▼                   ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor (multi-profile host)                                  │
//! │  - Bus (broadcast events)                                         │
//! │  - SlotPool (FIFO emulator slots shared by all profiles)          │
//! │  - SubscriberSet (fans out to user subscribers)                   │
//! │  - TaskFactory (kind → task constructor)                          │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  Scheduler   │   │  Scheduler   │   │  Scheduler   │
//!     │ queue+worker │   │ queue+worker │   │ queue+worker │
//!     │ help ticker  │   │ help ticker  │   │ help ticker  │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘
//!      │ TaskScheduled    │ Paused           │ IdleEntered
//!      │ TaskStarting     │ ReconnectArmed   │ SlotReleased
//!      │ TaskFailed ...   │ ...              │ ...
//!      ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  forwarding listener   │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                     ┌─────────────┼─────────────┐
//!                     ▼             ▼             ▼
//!                 LogWriter  TaskStateMirror  StatusBoard
//! ```
//!
//! ### Worker loop
//! ```text
//! acquire slot (FIFO, reports queue position)
//! loop {
//!   ├─► reconnect timer fired? ─► resume, dismiss prompt, Initialize now
//!   ├─► paused?                ─► status "Paused", sleep(pause_poll)
//!   ├─► pop first due entry (Initialize first, then by delay)
//!   │       ├─ run_once(task, timeout)  (panics contained)
//!   │       ├─ Err ─► recover: Reinitialize | ReconnectNow | ReconnectAfter(d)
//!   │       ├─ recurring ─► cooldown floor, re-queue (merge with duplicates)
//!   │       ├─ one-shot  ─► TaskDropped
//!   │       └─ progress task + auto daily missions ─► DailyMissions now
//!   ├─► idle check: nothing due within threshold ─► close emulator, release slot
//!   │               next task within wake_ahead  ─► reacquire slot, Initialize
//!   └─► status "Idling for HH:MM:SS", sleep(tick)
//! }
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                          |
//! |-------------------|---------------------------------------------------------------|---------------------------------------------|
//! | **Tasks**         | Define tasks as types or closures, build them by kind.        | [`Task`], [`TaskFn`], [`TaskTable`]         |
//! | **Scheduling**    | Per-profile queue with dedup, pause/resume, idle mode.        | [`Scheduler`], [`TaskQueue`]                |
//! | **Supervision**   | Host many profiles, shared slots, graceful shutdown.          | [`Supervisor`], [`SlotPool`]                |
//! | **Subscriber API**| Hook into scheduler events (logging, UI mirrors).             | [`Subscribe`], [`TaskStateMirror`]          |
//! | **Policies**      | Cooldown growth for tasks that fail to reschedule.            | [`BackoffPolicy`], [`JitterPolicy`]         |
//! | **Errors**        | Typed task failures with recovery classification.             | [`TaskError`], [`Recovery`], [`RuntimeError`] |
//! | **Configuration** | Runtime knobs plus live per-profile settings.                 | [`SchedulerConfig`], [`ProfileSettings`]    |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use profilevisor::{
//!     MemorySettings, SchedulerBuilder, TaskContext, TaskError, TaskFn, TaskKind, TaskRef,
//!     TaskTable,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let table = TaskTable::new().with(TaskKind::Gather, |_profile, _key| -> TaskRef {
//!         TaskFn::arc(TaskKind::Gather, |ctx: TaskContext| async move {
//!             // march troops out, then come back in an hour
//!             ctx.reschedule_in(Duration::from_secs(3600));
//!             Ok::<_, TaskError>(())
//!         })
//!     });
//!
//!     let scheduler = SchedulerBuilder::new("main", Arc::new(table))
//!         .with_settings(Arc::new(MemorySettings::new()))
//!         .build();
//!     scheduler.execute_task_now(TaskKind::Gather, None)?;
//!     scheduler.start();
//!
//!     tokio::time::sleep(Duration::from_millis(50)).await;
//!     scheduler.stop().await?;
//!     Ok(())
//! }
//! ```
mod core;
mod emulator;
mod error;
mod events;
mod policies;
mod profile;
mod settings;
mod slots;
mod subscribers;
mod tasks;

#[cfg(test)]
mod test_support;

// ---- Public re-exports ----

pub use core::{
    Scheduler, SchedulerBuilder, SchedulerConfig, SchedulerHandle, Supervisor, SupervisorBuilder,
    SupervisorConfig, TaskQueue,
};
pub use emulator::{DetachedEmulator, EmulatorControl};
pub use error::{Recovery, RuntimeError, SlotError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use policies::{BackoffPolicy, JitterPolicy};
pub use profile::ProfileId;
pub use settings::{MemorySettings, ProfileSettings, keys};
pub use slots::{FifoSlotPool, SlotPool};
pub use subscribers::{
    LogWriter, ProfileStatus, StatusBoard, Subscribe, SubscriberSet, TaskState, TaskStateMirror,
};
pub use tasks::{
    ScheduledTask, Task, TaskContext, TaskFactory, TaskFn, TaskIdentity, TaskKind, TaskRef,
    TaskTable,
};
