//! # Task factory and dispatch table.
//!
//! The scheduler never inspects task types at runtime. Whenever it needs a
//! task it does not already hold (recovery initialization, force-now
//! prototypes, identity lookups), it asks a [`TaskFactory`].
//!
//! [`TaskTable`] is the standard factory: a map from [`TaskKind`] to a
//! constructor, built once at startup and shared by every profile.
//!
//! ## Example
//! ```rust
//! use profilevisor::{ProfileId, TaskContext, TaskError, TaskFactory, TaskFn, TaskKind, TaskRef, TaskTable};
//!
//! let table = TaskTable::new()
//!     .with(TaskKind::Initialize, |_profile, _key| -> TaskRef {
//!         TaskFn::arc(TaskKind::Initialize, |_ctx: TaskContext| async { Ok::<_, TaskError>(()) })
//!     });
//!
//! let task = table.create(TaskKind::Initialize, &ProfileId::from("main"), None).unwrap();
//! assert_eq!(task.kind(), TaskKind::Initialize);
//! assert!(table.create(TaskKind::Arena, &ProfileId::from("main"), None).is_err());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::RuntimeError;
use crate::profile::ProfileId;
use crate::tasks::{TaskKind, TaskRef};

/// Produces new task instances by kind.
pub trait TaskFactory: Send + Sync + 'static {
    /// Creates a task of `kind` for `profile`, optionally with a distinct key.
    fn create(
        &self,
        kind: TaskKind,
        profile: &ProfileId,
        distinct_key: Option<&str>,
    ) -> Result<TaskRef, RuntimeError>;
}

type Constructor = Arc<dyn Fn(&ProfileId, Option<&str>) -> TaskRef + Send + Sync>;

/// Dispatch table from kind to constructor.
#[derive(Clone, Default)]
pub struct TaskTable {
    constructors: HashMap<TaskKind, Constructor>,
}

impl TaskTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a constructor, replacing a previous one for the same kind.
    pub fn register<F>(&mut self, kind: TaskKind, constructor: F)
    where
        F: Fn(&ProfileId, Option<&str>) -> TaskRef + Send + Sync + 'static,
    {
        self.constructors.insert(kind, Arc::new(constructor));
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<F>(mut self, kind: TaskKind, constructor: F) -> Self
    where
        F: Fn(&ProfileId, Option<&str>) -> TaskRef + Send + Sync + 'static,
    {
        self.register(kind, constructor);
        self
    }

    /// True if a constructor exists for `kind`.
    pub fn contains(&self, kind: TaskKind) -> bool {
        self.constructors.contains_key(&kind)
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<TaskKind> {
        let mut kinds: Vec<TaskKind> = self.constructors.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }
}

impl TaskFactory for TaskTable {
    fn create(
        &self,
        kind: TaskKind,
        profile: &ProfileId,
        distinct_key: Option<&str>,
    ) -> Result<TaskRef, RuntimeError> {
        self.constructors
            .get(&kind)
            .map(|ctor| ctor(profile, distinct_key))
            .ok_or(RuntimeError::UnknownTaskKind { kind })
    }
}

impl fmt::Debug for TaskTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskTable")
            .field("kinds", &self.kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::noop_task;

    #[test]
    fn constructor_receives_distinct_key() {
        let table = TaskTable::new().with(TaskKind::Gather, |_p, key| noop_task(TaskKind::Gather, key));
        let task = table
            .create(TaskKind::Gather, &ProfileId::from("main"), Some("iron"))
            .expect("gather registered");
        assert_eq!(task.distinct_key(), Some("iron"));
    }

    #[test]
    fn unknown_kind_is_an_error() {
        let table = TaskTable::new();
        let err = table
            .create(TaskKind::Arena, &ProfileId::from("main"), None)
            .err()
            .expect("arena not registered");
        assert_eq!(err.as_label(), "runtime_unknown_task_kind");
    }
}
