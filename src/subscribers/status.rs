//! # Latest status line per profile.
//!
//! [`StatusBoard`] keeps the most recent `Status` text each scheduler
//! published, plus whether the profile is currently paused or idling.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Snapshot of one profile's status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileStatus {
    /// Last published status text.
    pub text: Option<Arc<str>>,
    pub paused: bool,
    pub idling: bool,
}

/// Last-known status of every profile.
#[derive(Debug, Default)]
pub struct StatusBoard {
    inner: RwLock<HashMap<Arc<str>, ProfileStatus>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies an event.
    pub fn apply(&self, ev: &Event) {
        let Some(profile) = ev.profile.as_ref() else {
            return;
        };
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        if ev.kind == EventKind::SchedulerStopped {
            map.remove(profile);
            return;
        }
        let entry = map.entry(Arc::clone(profile)).or_default();
        match ev.kind {
            EventKind::Status => entry.text = ev.status.clone(),
            EventKind::Paused => entry.paused = true,
            EventKind::Resumed => entry.paused = false,
            EventKind::IdleEntered => entry.idling = true,
            EventKind::IdleExited => entry.idling = false,
            _ => {}
        }
    }

    /// Status of a single profile.
    pub fn get(&self, profile: &str) -> Option<ProfileStatus> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.get(profile).cloned()
    }

    /// Profiles with a known status, sorted by name.
    pub fn profiles(&self) -> Vec<Arc<str>> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut out: Vec<_> = map.keys().cloned().collect();
        out.sort();
        out
    }
}

#[async_trait]
impl Subscribe for StatusBoard {
    async fn on_event(&self, event: &Event) {
        self.apply(event);
    }

    fn name(&self) -> &'static str {
        "status"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_latest_status_and_flags() {
        let board = StatusBoard::new();
        board.apply(&Event::new(EventKind::Status).with_profile("main").with_status("Executing Arena"));
        board.apply(&Event::new(EventKind::Paused).with_profile("main"));
        board.apply(&Event::new(EventKind::Status).with_profile("main").with_status("Paused"));

        let s = board.get("main").expect("known profile");
        assert_eq!(s.text.as_deref(), Some("Paused"));
        assert!(s.paused);
        assert!(!s.idling);

        board.apply(&Event::new(EventKind::SchedulerStopped).with_profile("main"));
        assert!(board.get("main").is_none());
    }
}
