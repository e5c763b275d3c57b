//! # Logging subscriber.
//!
//! [`LogWriter`] forwards every runtime event to `tracing` with structured
//! fields. Routine task traffic goes to `debug`, lifecycle changes to `info`,
//! failures and dropped events to `warn`.
//!
//! ## Example
//! ```no_run
//! # use std::sync::Arc;
//! # use profilevisor::{Bus, LogWriter, Subscribe, SubscriberSet};
//! # async fn demo() {
//! let bus = Bus::default();
//! let set = SubscriberSet::new(vec![Arc::new(LogWriter) as Arc<dyn Subscribe>], bus);
//! # }
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Subscriber that logs events through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let profile = e.profile.as_deref().unwrap_or("-");
        let task = e.task.as_deref().unwrap_or("-");

        match e.kind {
            EventKind::SchedulerStarted => info!(profile, "scheduler started"),
            EventKind::SchedulerStopped => info!(profile, "scheduler stopped"),
            EventKind::Paused => info!(profile, reason = ?e.reason, "paused"),
            EventKind::Resumed => info!(profile, "resumed"),
            EventKind::Status => {
                debug!(profile, status = e.status.as_deref().unwrap_or(""), "status");
            }
            EventKind::SlotWaiting => debug!(profile, position = ?e.position, "waiting for slot"),
            EventKind::SlotAcquired => info!(profile, "slot acquired"),
            EventKind::SlotReleased => info!(profile, "slot released"),
            EventKind::IdleEntered => info!(profile, delay_ms = ?e.delay_ms, "idling"),
            EventKind::IdleExited => info!(profile, "leaving idle"),
            EventKind::TaskScheduled => debug!(profile, task, "task scheduled"),
            EventKind::TaskStarting => info!(profile, task, "executing task"),
            EventKind::TaskCompleted => debug!(profile, task, "task completed"),
            EventKind::TaskFailed => {
                warn!(profile, task, reason = e.reason.as_deref().unwrap_or(""), "task failed");
            }
            EventKind::TaskDropped => debug!(profile, task, "one-shot task finished"),
            EventKind::TaskRemoved => info!(profile, task, "task removed"),
            EventKind::CooldownApplied => {
                warn!(profile, task, delay_ms = ?e.delay_ms, "rescheduled too soon; cooldown applied");
            }
            EventKind::ReconnectArmed => info!(profile, delay_ms = ?e.delay_ms, "reconnect armed"),
            EventKind::ReconnectFired => info!(profile, "reconnecting"),
            EventKind::HelpRequested => debug!(profile, "alliance help requested"),
            EventKind::ShutdownRequested => info!("shutdown requested"),
            EventKind::AllStoppedWithin => info!("all schedulers stopped within grace"),
            EventKind::GraceExceeded => warn!(stuck = ?e.reason, "grace exceeded"),
            EventKind::SubscriberPanicked | EventKind::SubscriberOverflow => {
                warn!(subscriber = task, reason = ?e.reason, kind = ?e.kind, "subscriber fault");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
