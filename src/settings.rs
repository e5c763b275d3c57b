//! # Per-profile live settings.
//!
//! [`ProfileSettings`] is the read side of the profile configuration store.
//! The scheduler reads it synchronously during loop iterations and never
//! caches values, so every read may observe a live change made by the GUI.
//!
//! Values are stored as strings; typed accessors parse on read and fall back
//! to `None` when a value is missing or malformed.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use profilevisor::{MemorySettings, ProfileSettings, TaskKind, keys};
//!
//! let settings = MemorySettings::new();
//! settings.set(keys::MAX_IDLE_MINUTES, "20");
//! settings.set(keys::ALLIANCE_HELP_ENABLED, "true");
//! settings.set(&keys::task_offset(TaskKind::Gather), "5");
//!
//! assert_eq!(settings.duration_minutes(keys::MAX_IDLE_MINUTES), Some(Duration::from_secs(1200)));
//! assert!(settings.flag(keys::ALLIANCE_HELP_ENABLED));
//! assert_eq!(settings.task_offset(TaskKind::Gather), Duration::from_secs(300));
//! ```

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use crate::tasks::TaskKind;

/// Well-known setting keys read by the scheduler.
pub mod keys {
    use crate::tasks::TaskKind;

    /// Idle threshold in minutes; `0` disables idling.
    pub const MAX_IDLE_MINUTES: &str = "max_idle_minutes";
    /// Schedule daily missions right after tasks that progress them.
    pub const AUTO_SCHEDULE_DAILY_MISSIONS: &str = "auto_schedule_daily_missions";
    /// Enables the periodic alliance-help side check.
    pub const ALLIANCE_HELP_ENABLED: &str = "alliance_help_enabled";
    /// Fallback reconnect delay for disconnects that carry none.
    pub const RECONNECT_DELAY_MINUTES: &str = "reconnect_delay_minutes";

    /// Key of the per-task offset (minutes) for `kind`.
    pub fn task_offset(kind: TaskKind) -> String {
        format!("{}_offset_minutes", kind.key())
    }
}

/// Read access to one profile's key/value settings.
pub trait ProfileSettings: Send + Sync + 'static {
    /// Returns the raw value for `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Boolean flag; missing or malformed values read as `false`.
    fn flag(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on"))
            .unwrap_or(false)
    }

    /// Unsigned integer value.
    fn number(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse().ok())
    }

    /// Value interpreted as a number of minutes.
    fn duration_minutes(&self, key: &str) -> Option<Duration> {
        self.number(key)
            .map(|m| Duration::from_secs(m.saturating_mul(60)))
    }

    /// Per-task offset; zero when unset.
    fn task_offset(&self, kind: TaskKind) -> Duration {
        self.duration_minutes(&keys::task_offset(kind))
            .unwrap_or(Duration::ZERO)
    }
}

/// In-memory settings store.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySettings {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled from `(key, value)` pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            values: RwLock::new(values),
        }
    }

    /// Sets (or overwrites) a value.
    pub fn set(&self, key: &str, value: impl Into<String>) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.into());
    }

    /// Removes a value.
    pub fn unset(&self, key: &str) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

impl ProfileSettings for MemorySettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_accepts_common_truthy_spellings() {
        let s = MemorySettings::from_pairs([("a", "TRUE"), ("b", "1"), ("c", "no"), ("d", "maybe")]);
        assert!(s.flag("a"));
        assert!(s.flag("b"));
        assert!(!s.flag("c"));
        assert!(!s.flag("d"));
        assert!(!s.flag("missing"));
    }

    #[test]
    fn malformed_numbers_read_as_none() {
        let s = MemorySettings::from_pairs([(keys::MAX_IDLE_MINUTES, "ten")]);
        assert_eq!(s.duration_minutes(keys::MAX_IDLE_MINUTES), None);
    }

    #[test]
    fn reads_observe_live_updates() {
        let s = MemorySettings::new();
        assert!(!s.flag(keys::ALLIANCE_HELP_ENABLED));
        s.set(keys::ALLIANCE_HELP_ENABLED, "on");
        assert!(s.flag(keys::ALLIANCE_HELP_ENABLED));
        s.unset(keys::ALLIANCE_HELP_ENABLED);
        assert!(!s.flag(keys::ALLIANCE_HELP_ENABLED));
    }

    #[test]
    fn task_offset_defaults_to_zero() {
        let s = MemorySettings::new();
        assert_eq!(s.task_offset(TaskKind::Gather), Duration::ZERO);
        s.set(&keys::task_offset(TaskKind::Gather), "3");
        assert_eq!(s.task_offset(TaskKind::Gather), Duration::from_secs(180));
    }
}
