//! # Run a single task execution.
//!
//! Executes one run of a [`ScheduledTask`] with an optional timeout, catching
//! panics at the execution boundary, and publishes the outcome to the [`Bus`].
//!
//! ## Event flow
//! ```text
//! Success:  execute(ctx) → Ok(())            → publish TaskCompleted
//! Failure:  execute(ctx) → Err(e)            → publish TaskFailed
//! Panic:    execute(ctx) → unwind            → publish TaskFailed (Panicked)
//! Timeout:  timeout exceeded → cancel ctx    → publish TaskFailed (Timeout)
//! ```
//!
//! ## Rules
//! - Always publishes **exactly one** terminal event
//! - Nothing escapes: the result is always a `Result<(), TaskError>`
//! - On timeout the context token is cancelled so the body can wind down

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio::time;

use crate::{
    error::TaskError,
    events::{Bus, Event, EventKind},
    subscribers::panic_message,
    tasks::{ScheduledTask, TaskContext},
};

/// Executes `entry` once with `ctx`, publishing the terminal event to `bus`.
pub(crate) async fn run_once(
    entry: &ScheduledTask,
    ctx: TaskContext,
    timeout: Option<Duration>,
    bus: &Bus,
) -> Result<(), TaskError> {
    let token = ctx.token().clone();
    let fut = AssertUnwindSafe(entry.task().execute(ctx)).catch_unwind();

    let caught = if let Some(dur) = timeout.filter(|d| !d.is_zero()) {
        match time::timeout(dur, fut).await {
            Ok(r) => r,
            Err(_elapsed) => {
                token.cancel();
                Ok(Err(TaskError::Timeout { timeout: dur }))
            }
        }
    } else {
        fut.await
    };

    let res = caught.unwrap_or_else(|panic| {
        Err(TaskError::Panicked {
            info: panic_message(panic.as_ref()),
        })
    });

    let ev = match &res {
        Ok(()) => Event::new(EventKind::TaskCompleted),
        Err(e) => Event::new(EventKind::TaskFailed).with_reason(e.as_message()),
    };
    bus.publish(
        ev.with_profile(entry.profile().as_arc())
            .with_task(entry.name(), entry.kind()),
    );
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tokio::time::Instant;
    use tokio_util::sync::CancellationToken;

    use crate::core::SchedulerHandle;
    use crate::profile::ProfileId;
    use crate::settings::MemorySettings;
    use crate::tasks::{Schedule, TaskFn, TaskKind};

    fn ctx() -> TaskContext {
        TaskContext::new(
            ProfileId::from("main"),
            Schedule {
                scheduled_at: Instant::now(),
                recurring: true,
            },
            None,
            Arc::new(MemorySettings::new()),
            SchedulerHandle::detached(),
            CancellationToken::new(),
        )
    }

    fn entry(task: crate::tasks::TaskRef) -> ScheduledTask {
        ScheduledTask::new(task, ProfileId::from("main"))
    }

    async fn next_event(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Event {
        rx.recv().await.expect("event")
    }

    #[tokio::test]
    async fn success_publishes_completed() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let e = entry(TaskFn::arc(TaskKind::Arena, |_ctx: TaskContext| async {
            Ok::<_, TaskError>(())
        }));

        assert!(run_once(&e, ctx(), None, &bus).await.is_ok());
        let ev = next_event(&mut rx).await;
        assert_eq!(ev.kind, EventKind::TaskCompleted);
        assert_eq!(ev.task_kind, Some(TaskKind::Arena));
        assert_eq!(ev.profile.as_deref(), Some("main"));
    }

    #[tokio::test]
    async fn panic_is_contained() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let e = entry(TaskFn::arc(TaskKind::Arena, |_ctx: TaskContext| async {
            if true {
                panic!("screen vanished");
            }
            Ok::<_, TaskError>(())
        }));

        let err = run_once(&e, ctx(), None, &bus).await.unwrap_err();
        assert!(matches!(err, TaskError::Panicked { ref info } if info == "screen vanished"));
        assert_eq!(next_event(&mut rx).await.kind, EventKind::TaskFailed);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_cancels_the_context() {
        let bus = Bus::new(8);
        let e = entry(TaskFn::arc(TaskKind::Arena, |ctx: TaskContext| async move {
            ctx.token().cancelled().await;
            Ok::<_, TaskError>(())
        }));
        let c = ctx();
        let token = c.token().clone();

        let err = run_once(&e, c, Some(Duration::from_secs(5)), &bus)
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::Timeout { .. }));
        assert!(token.is_cancelled());
    }
}
