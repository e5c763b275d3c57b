//! # Scheduler worker loop.
//!
//! One worker per running [`Scheduler`]. It holds only a weak reference, so a
//! dropped scheduler ends its worker on the next iteration.
//!
//! ## Iteration
//! ```text
//! reconnect fired? ──► acquire slot, resume, dismiss prompt, Initialize
//! paused?          ──► status "Paused", sleep pause_poll
//! not idling       ──► pop first due entry ──► execute ──► recover ──► cooldown
//!                                                       ──► re-insert / drop
//!                                                       ──► daily missions
//! idle evaluation  ──► (skipped while paused)
//!                  ──► enter idle (close emulator, release slot)
//!                  ──► leave idle (acquire slot, Initialize)
//! nothing executed ──► status "Idling for ...", sleep tick
//! ```

use std::sync::{Arc, Weak};
use std::time::{Duration, SystemTime};

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::queue::Forced;
use crate::core::runner::run_once;
use crate::core::Scheduler;
use crate::error::{Recovery, TaskError};
use crate::events::{Event, EventKind};
use crate::settings::keys;
use crate::tasks::{Schedule, ScheduledTask, TaskContext, TaskKind};

/// Worker entry point.
pub(super) async fn run(scheduler: Weak<Scheduler>, token: CancellationToken) {
    {
        let Some(s) = scheduler.upgrade() else {
            return;
        };
        if !s.acquire_slot(&token).await {
            return;
        }
    }

    loop {
        if token.is_cancelled() {
            break;
        }
        let Some(s) = scheduler.upgrade() else {
            break;
        };
        let pause = s.iteration(&token).await;
        drop(s);

        if pause.is_zero() {
            tokio::task::yield_now().await;
            continue;
        }
        tokio::select! {
            _ = token.cancelled() => break,
            _ = time::sleep(pause) => {}
        }
    }
    debug!("worker exited");
}

impl Scheduler {
    /// One loop iteration; returns how long to sleep afterwards.
    async fn iteration(self: &Arc<Self>, token: &CancellationToken) -> Duration {
        if self.reconnect.take_ready() {
            self.fire_reconnect(token).await;
        }

        if self.is_paused() {
            self.publish_status("Paused");
            return self.cfg.pause_poll;
        }

        let mut executed = false;
        if !self.is_idling() {
            if let Some(entry) = self.queue.pop_due(Instant::now()) {
                self.execute(entry, token).await;
                executed = true;
            }
        }
        if token.is_cancelled() {
            return Duration::ZERO;
        }

        // A disconnect may have paused us; the slot stays held until reconnect.
        if !self.is_paused() {
            self.evaluate_idle(token).await;
        }

        if executed {
            return Duration::ZERO;
        }
        let status = match self.queue.soonest(Instant::now()) {
            Some((delay, name)) => format!("Idling for {}\nNext task: {name}", hms(delay)),
            None => "Idling\nNo tasks scheduled".to_string(),
        };
        self.publish_status(status);
        self.cfg.tick
    }

    /// Executes one popped entry and puts it back (or drops it).
    async fn execute(self: &Arc<Self>, mut entry: ScheduledTask, token: &CancellationToken) {
        let name = entry.name();
        let kind = entry.kind();
        let previous_run = entry.last_executed_at();
        let started = SystemTime::now();
        entry.mark_started(started);

        info!(profile = %self.profile, task = %name, "executing task");
        self.publish_status(format!("Executing {name}"));
        self.publish(
            Event::new(EventKind::TaskStarting)
                .with_task(name.as_str(), kind)
                .with_last_run(Some(started)),
        );

        let ctx = TaskContext::new(
            self.profile.clone(),
            Schedule {
                scheduled_at: entry.scheduled_at(),
                recurring: entry.is_recurring(),
            },
            previous_run,
            Arc::clone(&self.settings),
            self.handle(),
            token.child_token(),
        );

        let res = {
            let _emulator = self.emulator_lock.lock().await;
            run_once(&entry, ctx.clone(), self.cfg.execution_timeout(), &self.bus).await
        };

        let schedule = ctx.schedule();
        entry.reschedule(schedule.scheduled_at);
        entry.set_recurring(schedule.recurring);

        match &res {
            Ok(()) if kind.is_initialization() => self.reset_init_strikes(),
            Ok(()) => {}
            Err(err) => {
                warn!(profile = %self.profile, task = %name, error = %err, label = err.as_label(), "task failed");
                self.recover(err, kind).await;
            }
        }
        if token.is_cancelled() {
            return;
        }

        let id = entry.identity().clone();
        if entry.is_recurring() {
            self.apply_cooldown(&mut entry);
            self.queue.merge(entry);
            self.publish_scheduled(&id);
        } else if self.queue.contains(&id) {
            self.publish_scheduled(&id);
        } else {
            self.publish(Event::new(EventKind::TaskDropped).with_task(name.as_str(), kind));
        }

        if kind.contributes_to_daily_missions()
            && self.settings.flag(keys::AUTO_SCHEDULE_DAILY_MISSIONS)
        {
            self.bring_forward(TaskKind::DailyMissions);
        }
    }

    /// Holds back a task that did not move itself far enough into the future.
    fn apply_cooldown(&self, entry: &mut ScheduledTask) {
        let now = Instant::now();
        let ahead = entry.remaining(now);
        if !self.cfg.cooldown.is_strike(ahead) {
            entry.set_strikes(0);
            return;
        }
        let strikes = entry.strikes();
        let cooldown = self.cfg.cooldown.delay_for(strikes);
        let floor = now + cooldown;
        if floor > entry.scheduled_at() {
            entry.reschedule(floor);
        }
        entry.set_strikes(strikes.saturating_add(1));

        if strikes == 0 {
            warn!(
                profile = %self.profile,
                task = %entry.name(),
                cooldown = ?cooldown,
                "task did not reschedule itself; cooldown applied"
            );
        } else {
            debug!(
                profile = %self.profile,
                task = %entry.name(),
                cooldown = ?cooldown,
                strikes = strikes.saturating_add(1),
                "cooldown applied again"
            );
        }
        self.publish(
            Event::new(EventKind::CooldownApplied)
                .with_task(entry.name(), entry.kind())
                .with_delay(cooldown),
        );
    }

    /// Performs the recovery a failure of a `failed` task classifies into.
    async fn recover(self: &Arc<Self>, err: &TaskError, failed: TaskKind) {
        let fallback = self
            .settings
            .duration_minutes(keys::RECONNECT_DELAY_MINUTES);

        match err.recovery(fallback) {
            Recovery::None => {}
            Recovery::Reinitialize => self.reinitialize(failed),
            Recovery::ReconnectNow => {
                self.dismiss_prompt().await;
                self.reinitialize(failed);
            }
            Recovery::ReconnectAfter(delay) => {
                self.pause_with(Some("profile disconnected"));
                self.reconnect.arm(delay);
                info!(profile = %self.profile, delay = ?delay, "disconnected; reconnect armed");
                self.publish(Event::new(EventKind::ReconnectArmed).with_delay(delay));
                self.publish_status(format!("Disconnected, reconnecting in {}", hms(delay)));
            }
        }
    }

    /// Queues initialization after a failure.
    ///
    /// A failed `Initialize` is retried after the cooldown for the number of
    /// initializations that failed in a row, not immediately.
    fn reinitialize(&self, failed: TaskKind) {
        if !failed.is_initialization() {
            self.bring_forward(TaskKind::Initialize);
            return;
        }
        let strikes = self.strike_init();
        let delay = self.cfg.cooldown.delay_for(strikes);
        debug!(profile = %self.profile, delay = ?delay, strikes = strikes.saturating_add(1), "initialization failed; retrying later");
        self.bring_forward_at(TaskKind::Initialize, Instant::now() + delay);
    }

    /// Reconnect after the timer fired, unless resumed meanwhile.
    ///
    /// The slot is taken back first so the emulator is only driven while held.
    async fn fire_reconnect(self: &Arc<Self>, token: &CancellationToken) {
        if !self.is_paused() {
            debug!(profile = %self.profile, "reconnect fired while running; ignored");
            return;
        }
        if !self.acquire_slot(token).await {
            return;
        }
        if self.is_idling() {
            self.set_idling(false);
            self.publish(Event::new(EventKind::IdleExited));
        }
        info!(profile = %self.profile, "reconnecting");
        self.resume();
        self.publish(Event::new(EventKind::ReconnectFired));
        self.dismiss_prompt().await;
        self.bring_forward(TaskKind::Initialize);
    }

    async fn dismiss_prompt(&self) {
        let _emulator = self.emulator_lock.lock().await;
        if let Err(err) = self.emulator.dismiss_reconnect_prompt(&self.profile).await {
            warn!(profile = %self.profile, error = %err, "failed to dismiss reconnect prompt");
        }
    }

    /// Moves the `kind` entry to now (keeping its recurrence) or queues a
    /// one-shot instance; an entry that is already due is left alone.
    pub(super) fn bring_forward(&self, kind: TaskKind) {
        self.bring_forward_at(kind, Instant::now());
    }

    /// Like [`bring_forward`](Self::bring_forward), targeting `at`.
    fn bring_forward_at(&self, kind: TaskKind, at: Instant) {
        let task = match self.factory.create(kind, &self.profile, None) {
            Ok(task) => task,
            Err(err) => {
                warn!(profile = %self.profile, error = %err, "cannot schedule {kind}");
                return;
            }
        };
        let proto = ScheduledTask::new(task, self.profile.clone());
        let id = proto.identity().clone();
        if self.queue.bring_forward(proto, at) != Forced::AlreadyDue {
            self.publish_scheduled(&id);
        }
    }

    /// Enters or leaves idle mode based on the soonest queued task.
    async fn evaluate_idle(self: &Arc<Self>, token: &CancellationToken) {
        let threshold = self.idle_threshold();
        let soonest = self.queue.soonest(Instant::now()).map(|(delay, _)| delay);

        if self.is_idling() {
            let soon = soonest.is_some_and(|d| d < self.cfg.wake_ahead);
            if soon || threshold.is_none() {
                self.leave_idle(token).await;
            }
        } else if let Some(threshold) = threshold {
            if soonest.is_none_or(|d| d > threshold) {
                self.enter_idle(soonest).await;
            }
        }
    }

    /// Idle threshold from `max_idle_minutes`, else the configured default.
    /// `None` disables idling.
    fn idle_threshold(&self) -> Option<Duration> {
        match self.settings.duration_minutes(keys::MAX_IDLE_MINUTES) {
            Some(d) if d.is_zero() => None,
            Some(d) => Some(d),
            None => self.cfg.default_idle_threshold(),
        }
    }

    async fn enter_idle(&self, soonest: Option<Duration>) {
        {
            let _emulator = self.emulator_lock.lock().await;
            if let Err(err) = self.emulator.close(&self.profile).await {
                warn!(profile = %self.profile, error = %err, "failed to close emulator");
            }
        }
        self.release_slot();
        self.set_idling(true);

        info!(profile = %self.profile, soonest = ?soonest, "entering idle");
        let mut ev = Event::new(EventKind::IdleEntered);
        if let Some(delay) = soonest {
            ev = ev.with_delay(delay);
        }
        self.publish(ev);
    }

    async fn leave_idle(&self, token: &CancellationToken) {
        if !self.acquire_slot(token).await {
            return;
        }
        self.set_idling(false);
        self.bring_forward(TaskKind::Initialize);
        info!(profile = %self.profile, "leaving idle");
        self.publish(Event::new(EventKind::IdleExited));
    }

    /// Waits for a slot; `false` when cancelled or the pool refused.
    pub(super) async fn acquire_slot(&self, token: &CancellationToken) -> bool {
        if self.holds_slot() {
            return true;
        }
        let bus = self.bus.clone();
        let profile = self.profile.as_arc();
        let on_waiting = move |position: usize| {
            bus.publish(
                Event::new(EventKind::SlotWaiting)
                    .with_profile(Arc::clone(&profile))
                    .with_position(position),
            );
            bus.publish(
                Event::new(EventKind::Status)
                    .with_profile(Arc::clone(&profile))
                    .with_status(format!("Waiting for slot, position {position}")),
            );
        };

        tokio::select! {
            _ = token.cancelled() => false,
            res = self.slots.acquire(&self.profile, &on_waiting) => match res {
                Ok(()) => {
                    self.mark_slot_held();
                    debug!(profile = %self.profile, "slot acquired");
                    self.publish(Event::new(EventKind::SlotAcquired));
                    true
                }
                Err(err) => {
                    warn!(profile = %self.profile, error = %err, label = err.as_label(), "slot acquisition failed");
                    self.publish_status("No slot available");
                    false
                }
            },
        }
    }
}

/// Formats a duration as `HH:MM:SS`.
fn hms(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::hms;
    use std::time::Duration;

    #[test]
    fn formats_hours_minutes_seconds() {
        assert_eq!(hms(Duration::from_secs(0)), "00:00:00");
        assert_eq!(hms(Duration::from_secs(3 * 3600 + 7 * 60 + 9)), "03:07:09");
        assert_eq!(hms(Duration::from_millis(59_999)), "00:00:59");
    }
}
