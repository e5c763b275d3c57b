//! # Jitter policy for cooldown delays.
//!
//! [`JitterPolicy`] spreads cooldowns so that several profiles stuck on the
//! same misbehaving task do not hit their emulators in lockstep.
//!
//! - [`JitterPolicy::None`] - exact delay
//! - [`JitterPolicy::Equal`] - `delay/2 + random[0, delay/2]`
//!
//! Jitter never drops a cooldown below half of its base, so a jittered
//! cooldown still guarantees forward progress in time.

use rand::Rng;
use std::time::Duration;

/// Policy controlling randomization of cooldown delays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// No jitter: use exact delay.
    #[default]
    None,

    /// Equal jitter: delay = delay/2 + random[0, delay/2].
    Equal,
}

impl JitterPolicy {
    /// Applies jitter to the given delay.
    pub fn apply(&self, delay: Duration) -> Duration {
        match self {
            JitterPolicy::None => delay,
            JitterPolicy::Equal => equal_jitter(delay),
        }
    }
}

fn equal_jitter(delay: Duration) -> Duration {
    let ms = delay.as_millis().min(u128::from(u64::MAX)) as u64;
    if ms == 0 {
        return Duration::ZERO;
    }
    let half = ms / 2;
    let jitter = if half == 0 {
        0
    } else {
        rand::rng().random_range(0..=half)
    };
    Duration::from_millis(ms - half + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_identity() {
        let d = Duration::from_millis(1234);
        assert_eq!(JitterPolicy::None.apply(d), d);
    }

    #[test]
    fn equal_stays_within_half_and_full() {
        let base = Duration::from_secs(10);
        for _ in 0..200 {
            let d = JitterPolicy::Equal.apply(base);
            assert!(d >= Duration::from_secs(5), "{d:?}");
            assert!(d <= base, "{d:?}");
        }
    }

    #[test]
    fn equal_of_zero_is_zero() {
        assert_eq!(JitterPolicy::Equal.apply(Duration::ZERO), Duration::ZERO);
    }
}
