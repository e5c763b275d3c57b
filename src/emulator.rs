//! # Emulator control surface consumed by the scheduler.
//!
//! The scheduler itself never taps or reads the screen. It only needs three
//! coarse operations from the emulator layer:
//! - close the emulator when the profile goes idle;
//! - dismiss the in-game "reconnect" prompt after a disconnect;
//! - run the best-effort alliance-help side check.
//!
//! Everything else (tap/swipe/template search/OCR) belongs to task bodies.

use async_trait::async_trait;
use tracing::debug;

use crate::error::TaskError;
use crate::profile::ProfileId;

/// Coarse emulator operations used by the scheduler.
#[async_trait]
pub trait EmulatorControl: Send + Sync + 'static {
    /// Closes the profile's emulator instance (entering idle).
    async fn close(&self, profile: &ProfileId) -> Result<(), TaskError>;

    /// Dismisses the in-game reconnect prompt, if shown.
    async fn dismiss_reconnect_prompt(&self, profile: &ProfileId) -> Result<(), TaskError>;

    /// Searches for the alliance "help" affordance and taps it when present.
    ///
    /// Returns whether help was requested.
    async fn request_alliance_help(&self, profile: &ProfileId) -> Result<bool, TaskError>;
}

/// Emulator control that does nothing besides logging.
///
/// Used when the builder is not given a real emulator (dry runs, tests of the
/// scheduling logic alone).
#[derive(Debug, Default)]
pub struct DetachedEmulator;

#[async_trait]
impl EmulatorControl for DetachedEmulator {
    async fn close(&self, profile: &ProfileId) -> Result<(), TaskError> {
        debug!(%profile, "detached emulator: close");
        Ok(())
    }

    async fn dismiss_reconnect_prompt(&self, profile: &ProfileId) -> Result<(), TaskError> {
        debug!(%profile, "detached emulator: dismiss reconnect prompt");
        Ok(())
    }

    async fn request_alliance_help(&self, profile: &ProfileId) -> Result<bool, TaskError> {
        debug!(%profile, "detached emulator: alliance help");
        Ok(false)
    }
}
