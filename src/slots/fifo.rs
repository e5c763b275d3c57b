//! # Semaphore-backed FIFO slot pool.
//!
//! [`FifoSlotPool`] hands out a fixed number of slots in arrival order (tokio
//! semaphores are fair). Waiters are tracked in a list so each one can report
//! its position.
//!
//! ```text
//!            held: {main → permit, alt → permit}
//! acquire ──► semaphore (capacity 2) ──► waiters: [third, fourth]
//!                                            position 1 ┘      └ position 2
//! ```
//!
//! Positions are re-read every `position_interval` while waiting.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tracing::debug;

use crate::error::SlotError;
use crate::profile::ProfileId;
use crate::slots::SlotPool;

/// In-process slot pool with FIFO hand-out and position reporting.
#[derive(Debug)]
pub struct FifoSlotPool {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    held: Mutex<HashMap<ProfileId, OwnedSemaphorePermit>>,
    waiters: Mutex<VecDeque<u64>>,
    next_ticket: AtomicU64,
    position_interval: Duration,
}

impl FifoSlotPool {
    /// Creates a pool with `capacity` slots (at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            held: Mutex::new(HashMap::new()),
            waiters: Mutex::new(VecDeque::new()),
            next_ticket: AtomicU64::new(0),
            position_interval: Duration::from_secs(1),
        }
    }

    /// Sets how often waiting callers re-check their position.
    pub fn with_position_interval(mut self, interval: Duration) -> Self {
        self.position_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Number of callers waiting for a slot.
    pub fn waiting(&self) -> usize {
        self.waiters().len()
    }

    /// True if `profile` holds a slot.
    pub fn is_held(&self, profile: &ProfileId) -> bool {
        self.held().contains_key(profile)
    }

    /// Closes the pool; pending and future acquisitions fail with
    /// [`SlotError::Closed`]. Held slots stay held until released.
    pub fn close(&self) {
        self.semaphore.close();
    }

    fn grant(&self, profile: &ProfileId, permit: OwnedSemaphorePermit) {
        self.held().insert(profile.clone(), permit);
        debug!(profile = %profile, available = self.available(), "slot granted");
    }

    fn position(&self, ticket: u64) -> usize {
        self.waiters()
            .iter()
            .position(|t| *t == ticket)
            .map_or(1, |i| i + 1)
    }

    fn held(&self) -> MutexGuard<'_, HashMap<ProfileId, OwnedSemaphorePermit>> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn waiters(&self) -> MutexGuard<'_, VecDeque<u64>> {
        self.waiters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Removes a waiter ticket when the wait ends (granted, failed or dropped).
struct WaiterGuard<'a> {
    pool: &'a FifoSlotPool,
    ticket: u64,
}

impl Drop for WaiterGuard<'_> {
    fn drop(&mut self) {
        self.pool.waiters().retain(|t| *t != self.ticket);
    }
}

#[async_trait]
impl SlotPool for FifoSlotPool {
    async fn acquire(
        &self,
        profile: &ProfileId,
        on_waiting: &(dyn Fn(usize) + Send + Sync),
    ) -> Result<(), SlotError> {
        if self.is_held(profile) {
            return Ok(());
        }
        match Arc::clone(&self.semaphore).try_acquire_owned() {
            Ok(permit) => {
                self.grant(profile, permit);
                return Ok(());
            }
            Err(TryAcquireError::Closed) => return Err(SlotError::Closed),
            Err(TryAcquireError::NoPermits) => {}
        }

        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        self.waiters().push_back(ticket);
        let _guard = WaiterGuard { pool: self, ticket };

        let acquire = Arc::clone(&self.semaphore).acquire_owned();
        tokio::pin!(acquire);

        let mut reported = 0;
        loop {
            let position = self.position(ticket);
            if position != reported {
                on_waiting(position);
                reported = position;
            }
            tokio::select! {
                res = &mut acquire => {
                    let permit = res.map_err(|_| SlotError::Closed)?;
                    self.grant(profile, permit);
                    return Ok(());
                }
                _ = tokio::time::sleep(self.position_interval) => {}
            }
        }
    }

    fn release(&self, profile: &ProfileId) {
        if self.held().remove(profile).is_some() {
            debug!(profile = %profile, "slot released");
        }
    }
}
