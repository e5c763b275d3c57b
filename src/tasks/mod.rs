//! # Task abstractions and queue entries.
//!
//! This module provides the task-related types:
//! - [`Task`] - trait for implementing async automation behaviours
//! - [`TaskFn`] - function-based task implementation
//! - [`TaskRef`] - shared reference to a task (`Arc<dyn Task>`)
//! - [`TaskKind`] - closed set of behaviour discriminators
//! - [`ScheduledTask`] / [`TaskIdentity`] - queue entry and its logical identity
//! - [`TaskContext`] - per-execution context (reschedule, settings, handle)
//! - [`TaskFactory`] / [`TaskTable`] - construction by kind

mod context;
mod factory;
mod kind;
mod scheduled;
mod task;
mod task_fn;

pub(crate) use context::Schedule;
pub use context::TaskContext;
pub use factory::{TaskFactory, TaskTable};
pub use kind::TaskKind;
pub use scheduled::{ScheduledTask, TaskIdentity};
pub use task::{Task, TaskRef};
pub use task_fn::TaskFn;
