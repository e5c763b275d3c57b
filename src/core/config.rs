//! # Runtime configuration.
//!
//! Provides [`SchedulerConfig`] (per-profile worker timings) and
//! [`SupervisorConfig`] (registry-wide settings).
//!
//! Live per-profile values (idle threshold, daily-mission automation, help,
//! reconnect delay) come from [`ProfileSettings`](crate::ProfileSettings) and
//! take precedence; the config only provides fallbacks and timings.
//!
//! ## Sentinel values
//! - `idle_threshold = 0s` → never idle
//! - `task_timeout = 0s` → no execution timeout
//! - `help_interval = 0s` → alliance-help ticker disabled

use std::time::Duration;

use crate::policies::BackoffPolicy;

/// Timings and fallbacks for a single profile scheduler.
///
/// ## Field semantics
/// - `tick`: sleep between loop iterations when nothing executed
/// - `pause_poll`: sleep between iterations while paused
/// - `idle_threshold`: fallback when the profile has no `max_idle_minutes` (`0s` = never idle)
/// - `wake_ahead`: leave idle mode once the soonest task is closer than this
/// - `join_timeout`: how long `stop()` waits for the worker
/// - `task_timeout`: per-execution timeout (`0s` = none)
/// - `cooldown`: minimum cooldown for tasks that did not move themselves forward
/// - `help_interval`: period of the alliance-help ticker (`0s` = disabled)
/// - `bus_capacity`: event bus ring buffer size for standalone schedulers
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Idle sleep between iterations.
    pub tick: Duration,
    /// Sleep between iterations while paused.
    pub pause_poll: Duration,
    /// Default idle threshold.
    pub idle_threshold: Duration,
    /// Wake-ahead window for leaving idle mode.
    pub wake_ahead: Duration,
    /// Maximum wait for the worker in `stop()`.
    pub join_timeout: Duration,
    /// Per-execution timeout.
    pub task_timeout: Duration,
    /// Minimum cooldown growth.
    pub cooldown: BackoffPolicy,
    /// Alliance-help ticker period.
    pub help_interval: Duration,
    /// Event bus capacity when the scheduler owns its bus.
    pub bus_capacity: usize,
}

impl SchedulerConfig {
    /// Fallback idle threshold as an `Option` (`None` = never idle).
    #[inline]
    pub fn default_idle_threshold(&self) -> Option<Duration> {
        non_zero(self.idle_threshold)
    }

    /// Per-execution timeout as an `Option`.
    #[inline]
    pub fn execution_timeout(&self) -> Option<Duration> {
        non_zero(self.task_timeout)
    }

    /// Alliance-help period as an `Option`.
    #[inline]
    pub fn help_period(&self) -> Option<Duration> {
        non_zero(self.help_interval)
    }

    /// Bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for SchedulerConfig {
    /// - `tick = 1s`, `pause_poll = 1s`
    /// - `idle_threshold = 15min`, `wake_ahead = 1min`
    /// - `join_timeout = 10s`, `task_timeout = 0s` (none)
    /// - `cooldown = BackoffPolicy::default()`
    /// - `help_interval = 30s`, `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            pause_poll: Duration::from_secs(1),
            idle_threshold: Duration::from_secs(15 * 60),
            wake_ahead: Duration::from_secs(60),
            join_timeout: Duration::from_secs(10),
            task_timeout: Duration::ZERO,
            cooldown: BackoffPolicy::default(),
            help_interval: Duration::from_secs(30),
            bus_capacity: 1024,
        }
    }
}

/// Configuration of the multi-profile [`Supervisor`](crate::Supervisor).
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    /// Maximum time to wait for all schedulers to stop on shutdown.
    ///
    /// If exceeded, `RuntimeError::GraceExceeded` lists the stuck profiles.
    pub grace: Duration,
    /// Capacity of the shared event bus.
    pub bus_capacity: usize,
    /// Defaults for schedulers created through the supervisor.
    pub scheduler: SchedulerConfig,
}

impl SupervisorConfig {
    /// Bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for SupervisorConfig {
    /// `grace = 60s`, `bus_capacity = 1024`, default scheduler config.
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(60),
            bus_capacity: 1024,
            scheduler: SchedulerConfig::default(),
        }
    }
}

#[inline]
fn non_zero(d: Duration) -> Option<Duration> {
    if d.is_zero() { None } else { Some(d) }
}
