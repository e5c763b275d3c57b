//! Runtime events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: per-profile `Scheduler` workers, reconnect waiters,
//!   `Supervisor`, `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the supervisor's forwarding listener (fans out to the
//!   `SubscriberSet`), or any receiver obtained through [`Bus::subscribe`].

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
