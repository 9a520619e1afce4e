//! Delivery drivers
//!
//! Each driver owns one bay at the loading deck. The inventory dispatcher
//! assigns a restock run to a free bay; the parked driver wakes up, shuttles
//! between supplier and warehouse one truckload at a time, and parks again
//! when the run is delivered.

use crate::agents::handle::AgentHandle;
use crate::production::Warehouse;
use crate::types::{AgentKind, AgentLocation, AgentState, SimulationConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

/// One parking spot at the loading deck, the handoff point between the
/// inventory dispatcher and a driver.
#[derive(Debug)]
pub struct DeliveryBay {
    name: String,
    assignment: Mutex<u64>,
    parked: AtomicBool,
    wakeup: tokio::sync::Notify,
}

impl DeliveryBay {
    /// Create the bay for the `index`-th driver, initially parked and empty.
    pub fn new(index: usize) -> Self {
        Self {
            name: format!("BAY-{}", index),
            assignment: Mutex::new(0),
            parked: AtomicBool::new(true),
            wakeup: tokio::sync::Notify::new(),
        }
    }

    /// Bay name, for logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the driver is parked here with no outstanding assignment.
    pub fn is_free(&self) -> bool {
        self.parked.load(Ordering::SeqCst) && *self.lock() == 0
    }

    /// Hand the bay's driver a restock run of `units` raw material units.
    pub fn assign(&self, units: u64) {
        let mut assignment = self.lock();
        *assignment += units;
        debug!(bay = %self.name, units, "run assigned");
        self.wakeup.notify_one();
    }

    /// Park the driver back at the bay, making it assignable again.
    pub fn park(&self) {
        self.parked.store(true, Ordering::SeqCst);
    }

    /// Block until a run is assigned, then claim it. Claiming marks the
    /// driver as departed so the dispatcher stops considering this bay.
    pub async fn wait_assigned(&self) -> u64 {
        loop {
            // Register for the wakeup before checking, so an assign between
            // the check and the await is not lost.
            let notified = self.wakeup.notified();
            if let Some(units) = self.try_claim() {
                return units;
            }
            notified.await;
        }
    }

    fn try_claim(&self) -> Option<u64> {
        let mut assignment = self.lock();
        if *assignment == 0 {
            return None;
        }
        let units = *assignment;
        *assignment = 0;
        self.parked.store(false, Ordering::SeqCst);
        Some(units)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, u64> {
        self.assignment.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Parked,
    Traveling(AgentLocation),
    Loading,
    Unloading,
}

/// One delivery driver shuttling raw materials from supplier to warehouse.
#[derive(Debug)]
pub struct DeliveryAgent {
    handle: Arc<AgentHandle>,
    bay: Arc<DeliveryBay>,
    warehouse: Arc<Warehouse>,
    truck_capacity: u64,
    transport_time: Duration,
    request_time: Duration,
    phase: Phase,
    remaining: u64,
    loaded: u64,
}

impl DeliveryAgent {
    /// Create the `index`-th driver, parked at its bay.
    pub fn new(
        index: usize,
        config: &SimulationConfig,
        bay: Arc<DeliveryBay>,
        warehouse: Arc<Warehouse>,
    ) -> Self {
        Self {
            handle: Arc::new(AgentHandle::new(AgentKind::Delivery, index)),
            bay,
            warehouse,
            truck_capacity: config.truck_capacity as u64,
            transport_time: config.transport_time(),
            request_time: config.request_time(),
            phase: Phase::Parked,
            remaining: 0,
            loaded: 0,
        }
    }

    /// Shared view of this agent's state.
    pub fn handle(&self) -> &Arc<AgentHandle> {
        &self.handle
    }

    /// One scheduling step; returns how long to sleep before the next.
    pub async fn step(&mut self) -> Duration {
        match self.phase {
            Phase::Parked => {
                self.handle.set(AgentState::Waiting, "parked, waiting for a run");
                let units = self.bay.wait_assigned().await;
                self.remaining = units;
                info!(agent = %self.handle.id(), units, "run accepted");
                self.depart(AgentLocation::Supplier, "driving to the supplier")
            }
            Phase::Traveling(destination) => self.arrive(destination),
            Phase::Loading => self.load_one(),
            Phase::Unloading => self.unload_one(),
        }
    }

    fn arrive(&mut self, destination: AgentLocation) -> Duration {
        self.handle.set_location(destination);
        match destination {
            AgentLocation::Supplier => {
                self.phase = Phase::Loading;
                self.handle.set(AgentState::Working, "loading the truck");
            }
            AgentLocation::Warehouse => {
                self.phase = Phase::Unloading;
                self.handle.set(AgentState::Working, "unloading the truck");
            }
            _ => {
                self.bay.park();
                self.phase = Phase::Parked;
                self.handle.set(AgentState::Idle, "run delivered");
            }
        }
        self.request_time
    }

    // One unit per tick onto the truck, bounded by capacity and by what is
    // left of the run.
    fn load_one(&mut self) -> Duration {
        self.loaded += 1;
        self.remaining -= 1;
        if self.loaded >= self.truck_capacity || self.remaining == 0 {
            return self.depart(AgentLocation::Warehouse, "driving to the warehouse");
        }
        self.request_time
    }

    fn unload_one(&mut self) -> Duration {
        self.warehouse.add(0, 1);
        self.loaded -= 1;
        if self.loaded > 0 {
            return self.request_time;
        }
        if self.remaining > 0 {
            self.depart(AgentLocation::Supplier, "back to the supplier")
        } else {
            self.depart(AgentLocation::LoadingDeck, "returning to the deck")
        }
    }

    fn depart(&mut self, destination: AgentLocation, activity: &str) -> Duration {
        self.phase = Phase::Traveling(destination);
        self.handle.set(AgentState::Moving, activity);
        self.transport_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver(truck_capacity: u32) -> DeliveryAgent {
        let config = SimulationConfig {
            truck_capacity,
            transport_time_ms: 1,
            request_time_ms: 1,
            ..Default::default()
        };
        let bay = Arc::new(DeliveryBay::new(0));
        let warehouse = Arc::new(Warehouse::new(6));
        DeliveryAgent::new(0, &config, bay, warehouse)
    }

    #[tokio::test]
    async fn test_bay_wait_sees_assignment_made_before_wait() {
        let bay = DeliveryBay::new(0);
        bay.assign(12);
        assert_eq!(bay.wait_assigned().await, 12);
        assert!(!bay.is_free());
        bay.park();
        assert!(bay.is_free());
    }

    #[tokio::test]
    async fn test_bay_wakes_parked_driver() {
        let bay = Arc::new(DeliveryBay::new(1));
        let waiter = {
            let bay = Arc::clone(&bay);
            tokio::spawn(async move { bay.wait_assigned().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        bay.assign(3);
        assert_eq!(waiter.await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_full_run_delivers_all_units_to_warehouse() {
        let mut agent = driver(4);
        agent.bay.assign(6);

        // Drive the machine until the driver parks again.
        for _ in 0..200 {
            agent.step().await;
            if agent.phase == Phase::Parked && agent.bay.is_free() {
                break;
            }
        }
        // 6 units, two trips (4 + 2), all landed in the raw material slot
        assert_eq!(agent.warehouse.stock(0), 6);
        assert!(agent.bay.is_free());
        assert_eq!(agent.handle().location(), AgentLocation::LoadingDeck);
    }

    #[tokio::test]
    async fn test_truck_capacity_bounds_a_single_trip() {
        let mut agent = driver(4);
        agent.bay.assign(10);

        // Park → accept → travel → arrive at supplier
        agent.step().await;
        agent.step().await;
        assert_eq!(agent.phase, Phase::Loading);

        // Four load ticks fill the truck; departure happens on the fourth.
        for _ in 0..4 {
            agent.step().await;
        }
        assert_eq!(agent.phase, Phase::Traveling(AgentLocation::Warehouse));
        assert_eq!(agent.loaded, 4);
        assert_eq!(agent.remaining, 6);
    }
}
