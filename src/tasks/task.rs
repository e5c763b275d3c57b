//! # Task abstraction.
//!
//! This module defines the [`Task`] trait: one automation behaviour with a
//! kind, an optional distinct key and an async [`execute`](Task::execute).
//! The common handle type is [`TaskRef`], an `Arc<dyn Task>` shared between
//! the queue, the factory and the worker.
//!
//! A task receives a [`TaskContext`] through which it moves itself in time
//! (`reschedule`), turns itself one-shot (`set_recurring(false)`), reads the
//! profile settings and talks back to its scheduler.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TaskError;
use crate::tasks::{TaskContext, TaskKind};

/// # Unit of automation work.
///
/// The `(kind, distinct_key)` pair, together with the owning profile, forms
/// the task's logical identity (see [`TaskIdentity`](crate::TaskIdentity)).
///
/// # Example
/// ```
/// use std::time::Duration;
/// use async_trait::async_trait;
/// use profilevisor::{Task, TaskContext, TaskError, TaskKind};
///
/// struct Heal;
///
/// #[async_trait]
/// impl Task for Heal {
///     fn kind(&self) -> TaskKind { TaskKind::HealInjured }
///
///     async fn execute(&self, ctx: TaskContext) -> Result<(), TaskError> {
///         if ctx.is_cancelled() {
///             return Ok(());
///         }
///         // tap the hospital, read the remaining heal timer...
///         ctx.reschedule_in(Duration::from_secs(15 * 60));
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Behaviour discriminator.
    fn kind(&self) -> TaskKind;

    /// Secondary identity discriminator (e.g. resource type for gathering).
    fn distinct_key(&self) -> Option<&str> {
        None
    }

    /// Performs the automation behaviour once.
    ///
    /// Implementations are expected to move themselves into the future via
    /// [`TaskContext::reschedule`]; a task that does not is held back by the
    /// scheduler's minimum cooldown.
    async fn execute(&self, ctx: TaskContext) -> Result<(), TaskError>;
}

/// Shared handle to a task.
pub type TaskRef = Arc<dyn Task>;
