//! Inventory dispatcher
//!
//! Workers file material requests at the materials desk; the inventory agent
//! drains the desk by assigning truck-capacity chunks to whichever delivery
//! bays are free. The desk is a plain pending counter — requests from many
//! workers coalesce, and the dispatcher does not care who asked.

use crate::agents::delivery::DeliveryBay;
use crate::agents::handle::AgentHandle;
use crate::types::{AgentKind, AgentState, SimulationConfig};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

/// Coalesced counter of raw material units requested but not yet dispatched.
#[derive(Debug, Default)]
pub struct MaterialsDesk {
    pending: Mutex<u64>,
}

impl MaterialsDesk {
    /// Create an empty desk.
    pub fn new() -> Self {
        Self::default()
    }

    /// File a request for `units` more raw material units.
    pub fn request(&self, units: u64) {
        let mut pending = self.lock();
        *pending += units;
        debug!(units, pending = *pending, "materials requested");
    }

    /// Units requested and not yet dispatched.
    pub fn pending(&self) -> u64 {
        *self.lock()
    }

    /// Claim up to `max` pending units for one dispatch. Returns the amount
    /// actually claimed, possibly zero.
    pub fn claim_up_to(&self, max: u64) -> u64 {
        let mut pending = self.lock();
        let claimed = (*pending).min(max);
        *pending -= claimed;
        claimed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, u64> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// The agent that turns pending material requests into delivery runs.
#[derive(Debug)]
pub struct InventoryAgent {
    handle: Arc<AgentHandle>,
    desk: Arc<MaterialsDesk>,
    bays: Vec<Arc<DeliveryBay>>,
    truck_capacity: u64,
    request_time: Duration,
}

impl InventoryAgent {
    /// Create the dispatcher. One per simulation.
    pub fn new(
        config: &SimulationConfig,
        desk: Arc<MaterialsDesk>,
        bays: Vec<Arc<DeliveryBay>>,
    ) -> Self {
        Self {
            handle: Arc::new(AgentHandle::new(AgentKind::Inventory, 0)),
            desk,
            bays,
            truck_capacity: config.truck_capacity as u64,
            request_time: config.request_time(),
        }
    }

    /// Shared view of this agent's state.
    pub fn handle(&self) -> &Arc<AgentHandle> {
        &self.handle
    }

    /// One dispatch pass. Assigns the largest possible chunk to every free
    /// bay until the desk is drained or bays run out.
    pub fn step(&mut self) -> Duration {
        if self.desk.pending() == 0 {
            self.handle.set(AgentState::Idle, "stock requests clear");
            return self.request_time;
        }

        let mut dispatched = 0u64;
        for bay in &self.bays {
            if self.desk.pending() == 0 {
                break;
            }
            if bay.is_free() {
                let chunk = self.desk.claim_up_to(self.truck_capacity);
                if chunk > 0 {
                    bay.assign(chunk);
                    dispatched += chunk;
                    info!(
                        agent = %self.handle.id(),
                        bay = bay.name(),
                        units = chunk,
                        "restock run dispatched"
                    );
                }
            }
        }

        if dispatched > 0 {
            self.handle.set(AgentState::Working, "dispatching restock runs");
        } else {
            // Materials pending but every truck is out.
            self.handle.set(AgentState::Waiting, "waiting for a free truck");
        }
        self.request_time
    }
}
