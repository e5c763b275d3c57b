//! Execution slots shared across profiles.
//!
//! - [`SlotPool`] the contract schedulers acquire and release through
//! - [`FifoSlotPool`] in-process, semaphore-backed implementation

mod fifo;
mod pool;

pub use fifo::FifoSlotPool;
pub use pool::SlotPool;
