//! # Function-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: Fn(TaskContext) -> Fut`, producing a fresh
//! future per execution. There is no hidden mutation between runs; share
//! state explicitly through `Arc<...>` captured by the closure.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use profilevisor::{TaskContext, TaskError, TaskFn, TaskKind, TaskRef};
//!
//! let gather_wood: TaskRef = TaskFn::keyed(TaskKind::Gather, "wood", |ctx: TaskContext| async move {
//!     // dispatch a march, read its return timer...
//!     ctx.reschedule_in(Duration::from_secs(40 * 60));
//!     Ok::<_, TaskError>(())
//! });
//!
//! assert_eq!(gather_wood.kind(), TaskKind::Gather);
//! assert_eq!(gather_wood.distinct_key(), Some("wood"));
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TaskError;
use crate::tasks::{Task, TaskContext, TaskKind};

/// Function-backed task implementation.
pub struct TaskFn<F> {
    kind: TaskKind,
    distinct_key: Option<Cow<'static, str>>,
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task without a distinct key.
    pub fn new(kind: TaskKind, f: F) -> Self {
        Self {
            kind,
            distinct_key: None,
            f,
        }
    }

    /// Creates the task and returns it as a shared handle.
    pub fn arc(kind: TaskKind, f: F) -> Arc<Self> {
        Arc::new(Self::new(kind, f))
    }

    /// Creates a shared task carrying a distinct key.
    pub fn keyed(kind: TaskKind, key: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self {
            kind,
            distinct_key: Some(key.into()),
            f,
        })
    }
}

#[async_trait]
impl<F, Fut> Task for TaskFn<F>
where
    F: Fn(TaskContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    fn kind(&self) -> TaskKind {
        self.kind
    }

    fn distinct_key(&self) -> Option<&str> {
        self.distinct_key.as_deref()
    }

    async fn execute(&self, ctx: TaskContext) -> Result<(), TaskError> {
        (self.f)(ctx).await
    }
}
