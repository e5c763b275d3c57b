//! # Minimum cooldown for tasks that fail to move themselves forward.
//!
//! A task is expected to reschedule itself into the future during `execute()`.
//! When it does not (forgot, or bailed out early on an error), re-inserting it
//! as-is would make it due again immediately and spin the worker.
//! [`BackoffPolicy`] computes the floor applied in that case.
//!
//! The floor for consecutive strike `n` is `first × factor^n`, clamped to
//! `max`, then jittered. The base is derived from the strike count alone, so
//! jitter output never feeds back into later delays.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use profilevisor::{BackoffPolicy, JitterPolicy};
//!
//! let cooldown = BackoffPolicy {
//!     first: Duration::from_secs(5),
//!     max: Duration::from_secs(60),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(cooldown.delay_for(0), Duration::from_secs(5));
//! assert_eq!(cooldown.delay_for(2), Duration::from_secs(20));
//! assert_eq!(cooldown.delay_for(10), Duration::from_secs(60));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Growth policy for the under-reschedule cooldown.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Cooldown after the first strike; also the minimum distance into the
    /// future a task must reschedule itself to avoid a strike.
    pub first: Duration,
    /// Maximum cooldown.
    pub max: Duration,
    /// Multiplicative growth per consecutive strike (`>= 1.0`).
    pub factor: f64,
    /// Jitter applied to the clamped delay.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// `first = 5s`, `factor = 2.0`, `max = 5min`, no jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_secs(5),
            max: Duration::from_secs(5 * 60),
            factor: 2.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Cooldown for the given number of previous consecutive strikes.
    pub fn delay_for(&self, strikes: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let exp = strikes.min(i32::MAX as u32) as i32;
        let unclamped = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !unclamped.is_finite() || unclamped < 0.0 || unclamped > max_secs {
            self.max
        } else {
            Duration::from_secs_f64(unclamped)
        };
        self.jitter.apply(base)
    }

    /// True when a task rescheduled to `delay` from now counts as a strike.
    #[inline]
    pub fn is_strike(&self, delay: Duration) -> bool {
        delay < self.first
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(factor: f64, jitter: JitterPolicy) -> BackoffPolicy {
        BackoffPolicy {
            first: Duration::from_millis(100),
            max: Duration::from_secs(30),
            factor,
            jitter,
        }
    }

    #[test]
    fn first_strike_uses_first() {
        assert_eq!(
            policy(2.0, JitterPolicy::None).delay_for(0),
            Duration::from_millis(100)
        );
    }

    #[test]
    fn grows_exponentially_without_jitter() {
        let p = policy(2.0, JitterPolicy::None);
        assert_eq!(p.delay_for(1), Duration::from_millis(200));
        assert_eq!(p.delay_for(2), Duration::from_millis(400));
        assert_eq!(p.delay_for(4), Duration::from_millis(1600));
    }

    #[test]
    fn constant_factor_stays_flat() {
        let p = policy(1.0, JitterPolicy::None);
        for strikes in 0..10 {
            assert_eq!(p.delay_for(strikes), Duration::from_millis(100));
        }
    }

    #[test]
    fn first_above_max_clamps() {
        let p = BackoffPolicy {
            first: Duration::from_secs(10),
            max: Duration::from_secs(5),
            factor: 2.0,
            jitter: JitterPolicy::None,
        };
        assert_eq!(p.delay_for(0), Duration::from_secs(5));
    }

    #[test]
    fn overflow_clamps_to_max() {
        let p = policy(2.0, JitterPolicy::None);
        assert_eq!(p.delay_for(u32::MAX), Duration::from_secs(30));
    }

    #[test]
    fn equal_jitter_keeps_positive_floor() {
        let p = policy(2.0, JitterPolicy::Equal);
        for strikes in 0..12 {
            let base_ms = (100.0 * 2.0f64.powi(strikes as i32)).min(30_000.0);
            let d = p.delay_for(strikes);
            assert!(d >= Duration::from_millis((base_ms / 2.0) as u64), "{strikes}: {d:?}");
            assert!(d <= Duration::from_millis(base_ms as u64), "{strikes}: {d:?}");
        }
    }

    #[test]
    fn strike_threshold_is_first() {
        let p = policy(2.0, JitterPolicy::None);
        assert!(p.is_strike(Duration::ZERO));
        assert!(p.is_strike(Duration::from_millis(99)));
        assert!(!p.is_strike(Duration::from_millis(100)));
    }
}
