//! # Reconnect wait timer.
//!
//! After a disconnect with a known resume delay, the scheduler pauses and arms
//! a [`ReconnectTimer`]. One background waiter sleeps until the deadline and
//! flips the ready flag; the worker picks it up on its next iteration and
//! performs the actual reconnect.
//!
//! ```text
//! arm(d) ──► gen += 1, cancel old waiter ──► spawn waiter(gen, deadline)
//!                                                 │
//!                                  sleep_until(deadline)
//!                                                 │
//!                               gen still current? ──► ready = true
//! worker: take_ready() ──► resume + dismiss prompt + Initialize
//! ```
//!
//! Re-arming supersedes the previous deadline; a waiter that wakes anyway
//! finds a newer generation and does nothing.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct Shared {
    generation: AtomicU64,
    ready: AtomicBool,
}

#[derive(Default)]
struct Armed {
    waiter: Option<CancellationToken>,
    deadline: Option<Instant>,
}

/// One-shot, re-armable reconnect flag.
#[derive(Default)]
pub(crate) struct ReconnectTimer {
    shared: Arc<Shared>,
    armed: Mutex<Armed>,
}

impl ReconnectTimer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Arms the timer `delay` from now, superseding any pending deadline.
    ///
    /// Must be called inside a tokio runtime.
    pub(crate) fn arm(&self, delay: Duration) -> Instant {
        let deadline = Instant::now() + delay;
        let generation = self.shared.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.shared.ready.store(false, Ordering::Release);

        let token = CancellationToken::new();
        {
            let mut armed = self.lock();
            if let Some(old) = armed.waiter.replace(token.clone()) {
                old.cancel();
            }
            armed.deadline = Some(deadline);
        }

        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = time::sleep_until(deadline) => {
                    if shared.generation.load(Ordering::Acquire) == generation {
                        shared.ready.store(true, Ordering::Release);
                    }
                }
            }
        });
        deadline
    }

    /// Consumes the fired flag; `true` at most once per firing.
    pub(crate) fn take_ready(&self) -> bool {
        if self.shared.ready.swap(false, Ordering::AcqRel) {
            let mut armed = self.lock();
            armed.deadline = None;
            armed.waiter = None;
            true
        } else {
            false
        }
    }

    /// Disarms the timer; a pending waiter never fires.
    pub(crate) fn cancel(&self) {
        self.shared.generation.fetch_add(1, Ordering::AcqRel);
        self.shared.ready.store(false, Ordering::Release);
        let mut armed = self.lock();
        if let Some(token) = armed.waiter.take() {
            token.cancel();
        }
        armed.deadline = None;
    }

    /// Pending deadline, if armed and not yet consumed.
    pub(crate) fn deadline(&self) -> Option<Instant> {
        self.lock().deadline
    }

    fn lock(&self) -> MutexGuard<'_, Armed> {
        self.armed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_deadline() {
        let timer = ReconnectTimer::new();
        timer.arm(Duration::from_secs(600));
        assert!(timer.deadline().is_some());

        time::sleep(Duration::from_secs(599)).await;
        assert!(!timer.take_ready());

        time::sleep(Duration::from_secs(2)).await;
        assert!(timer.take_ready());
        assert!(!timer.take_ready());
        assert!(timer.deadline().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_supersedes_previous_deadline() {
        let timer = ReconnectTimer::new();
        timer.arm(Duration::from_secs(10));
        time::sleep(Duration::from_secs(5)).await;
        timer.arm(Duration::from_secs(60));

        time::sleep(Duration::from_secs(10)).await;
        assert!(!timer.take_ready());

        time::sleep(Duration::from_secs(56)).await;
        assert!(timer.take_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_firing() {
        let timer = ReconnectTimer::new();
        timer.arm(Duration::from_secs(10));
        timer.cancel();
        time::sleep(Duration::from_secs(20)).await;
        assert!(!timer.take_ready());
        assert!(timer.deadline().is_none());
    }
}
