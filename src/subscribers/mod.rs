//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`]
//! fan-out and the built-in subscribers fed by the [`Bus`](crate::Bus).
//!
//! ## Architecture
//! ```text
//!   Scheduler ── publish(Event) ──► Bus ──► SubscriberSet::emit
//!                                              │
//!                         ┌────────────────────┼──────────────────┐
//!                         ▼                    ▼                  ▼
//!                     LogWriter         TaskStateMirror      StatusBoard
//!                  (tracing lines)   (scheduled/executing)   (status text)
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use profilevisor::{Event, EventKind, Subscribe};
//! use async_trait::async_trait;
//!
//! struct FailureCounter;
//!
//! #[async_trait]
//! impl Subscribe for FailureCounter {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::TaskFailed {
//!             // increment failure counter
//!         }
//!     }
//! }
//! ```

mod log;
mod set;
mod status;
mod subscribe;
mod task_state;

pub use log::LogWriter;
pub(crate) use set::panic_message;
pub use set::SubscriberSet;
pub use status::{ProfileStatus, StatusBoard};
pub use subscribe::Subscribe;
pub use task_state::{TaskState, TaskStateMirror};
