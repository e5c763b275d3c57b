//! # Slot pool contract.
//!
//! A slot is the right to drive an emulator session. There are fewer slots
//! than profiles; a scheduler holds one while actively working and gives it
//! back while idling and on stop.

use async_trait::async_trait;

use crate::error::SlotError;
use crate::profile::ProfileId;

/// Bounds how many profiles may drive an emulator simultaneously.
///
/// ## Contract
/// - `acquire` completes once `profile` holds a slot; acquiring again while
///   holding one succeeds immediately
/// - while waiting, `on_waiting` receives the 1-based queue position whenever
///   it changes
/// - dropping the `acquire` future abandons the wait
/// - `release` is idempotent
#[async_trait]
pub trait SlotPool: Send + Sync + 'static {
    /// Waits for a slot for `profile`.
    async fn acquire(
        &self,
        profile: &ProfileId,
        on_waiting: &(dyn Fn(usize) + Send + Sync),
    ) -> Result<(), SlotError>;

    /// Gives the slot held by `profile` back.
    fn release(&self, profile: &ProfileId);
}
