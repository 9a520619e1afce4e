//! Capacity-bounded admission gates
//!
//! A buffer zone is the generic admission control used for workstation
//! capacity on the factory floor and, inside each facility server, for the
//! physical room capacity. It wraps a fair semaphore: waiters are admitted in
//! roughly arrival order and no waiter can be starved indefinitely.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Semaphore, TryAcquireError};
use tracing::{debug, trace};

/// Returned by [`BufferZone::enter`] once the zone has been shut down.
///
/// Closing is the cooperative-shutdown path: it promptly unblocks every
/// queued waiter so agent loops can wind down instead of hanging on the gate.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("buffer zone {zone} is closed")]
pub struct ZoneClosed {
    /// Name of the closed zone
    pub zone: String,
}

/// A capacity-bounded zone with fair FIFO admission.
#[derive(Debug)]
pub struct BufferZone {
    name: String,
    capacity: usize,
    semaphore: Arc<Semaphore>,
}

impl BufferZone {
    /// Create a zone admitting at most `capacity` occupants at once.
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self { name: name.into(), capacity, semaphore: Arc::new(Semaphore::new(capacity)) }
    }

    /// Wait for a free slot, then occupy it.
    ///
    /// Returns a guard whose drop releases the slot; release is guaranteed on
    /// every exit path, including panic and task cancellation, because the
    /// permit travels inside the guard. Fails only once the zone is closed.
    pub async fn enter(&self) -> Result<ZoneGuard, ZoneClosed> {
        trace!(zone = %self.name, "waiting for a slot");
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| ZoneClosed { zone: self.name.clone() })?;
        debug!(zone = %self.name, occupancy = self.occupancy(), capacity = self.capacity, "entered");
        Ok(ZoneGuard { zone: self.name.clone(), permit: Some(permit) })
    }

    /// Occupy a slot only if one is free right now.
    pub fn try_enter(&self) -> Result<Option<ZoneGuard>, ZoneClosed> {
        match Arc::clone(&self.semaphore).try_acquire_owned() {
            Ok(permit) => Ok(Some(ZoneGuard { zone: self.name.clone(), permit: Some(permit) })),
            Err(TryAcquireError::NoPermits) => Ok(None),
            Err(TryAcquireError::Closed) => Err(ZoneClosed { zone: self.name.clone() }),
        }
    }

    /// Close the zone, waking all queued waiters with [`ZoneClosed`].
    /// Already-issued guards remain valid and still release on drop.
    pub fn close(&self) {
        debug!(zone = %self.name, "closing");
        self.semaphore.close();
    }

    /// Whether the zone has been closed.
    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free.
    pub fn available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Slots currently occupied.
    pub fn occupancy(&self) -> usize {
        self.capacity - self.semaphore.available_permits()
    }

    /// Zone name, for logs and monitoring.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Occupancy of one zone slot. Dropping the guard leaves the zone.
#[derive(Debug)]
pub struct ZoneGuard {
    zone: String,
    permit: Option<tokio::sync::OwnedSemaphorePermit>,
}

impl ZoneGuard {
    /// Leave the zone, waking the next waiter if any. Equivalent to dropping
    /// the guard; provided for call sites where the release is the point.
    pub fn leave(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.permit.take().is_some() {
            trace!(zone = %self.zone, "left");
        }
    }
}

impl Drop for ZoneGuard {
    fn drop(&mut self) {
        self.release();
    }
}
