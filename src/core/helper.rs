//! # Alliance-help side check.
//!
//! A low-frequency ticker, independent of the worker loop cadence, that asks
//! the emulator to tap the alliance "help" button when it is shown.
//!
//! Skipped while paused, idling, without a slot, with the
//! `alliance_help_enabled` setting off, or while a task is driving the
//! emulator. Failures are logged at debug level and never affect scheduling.

use std::sync::Weak;
use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::Scheduler;
use crate::events::{Event, EventKind};
use crate::settings::keys;

/// Runs the help ticker until cancelled or the scheduler is dropped.
pub(super) async fn run(scheduler: Weak<Scheduler>, period: Duration, token: CancellationToken) {
    let mut interval = time::interval_at(time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = interval.tick() => {}
        }
        let Some(s) = scheduler.upgrade() else {
            break;
        };
        if s.is_paused()
            || s.is_idling()
            || !s.holds_slot()
            || !s.settings.flag(keys::ALLIANCE_HELP_ENABLED)
        {
            continue;
        }
        let Ok(_emulator) = s.emulator_lock.try_lock() else {
            continue;
        };

        match s.emulator.request_alliance_help(&s.profile).await {
            Ok(true) => s.publish(Event::new(EventKind::HelpRequested)),
            Ok(false) => {}
            Err(err) => debug!(profile = %s.profile, error = %err, "alliance help check failed"),
        }
    }
}
