//! Worker agents
//!
//! The production loop: claim an order, file a materials request, haul the
//! materials over from the warehouse, hold a workstation slot while
//! producing, and bank the finished units. Working ticks accumulate break
//! pressure; once a break triggers, the worker walks out and the facility
//! server takes over its state until the completion event comes back.

use crate::agents::handle::AgentHandle;
use crate::agents::inventory::MaterialsDesk;
use crate::facility::{FacilityConnection, FacilityKind};
use crate::production::{OrderQueue, ProductOrder, Warehouse};
use crate::types::{breaks, AgentKind, AgentLocation, AgentState, SimulationConfig};
use crate::zones::{BufferZone, ZoneGuard};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Traveling(AgentLocation),
    Gathering,
    Producing,
    OnBreak,
}

/// One production worker.
pub struct WorkerAgent {
    handle: Arc<AgentHandle>,
    orders: Arc<OrderQueue>,
    warehouse: Arc<Warehouse>,
    workstations: Arc<BufferZone>,
    desk: Arc<MaterialsDesk>,
    bathroom: FacilityConnection,
    breakroom: FacilityConnection,
    rng: StdRng,
    production_time: Duration,
    transport_time: Duration,
    request_time: Duration,
    phase: Phase,
    order: Option<ProductOrder>,
    materials_carried: u32,
    progress: u32,
    workstation: Option<ZoneGuard>,
    ticks_since_break: u32,
    current_break: Option<FacilityKind>,
}

impl WorkerAgent {
    /// Create the `index`-th worker, idle on the factory floor.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        index: usize,
        config: &SimulationConfig,
        orders: Arc<OrderQueue>,
        warehouse: Arc<Warehouse>,
        workstations: Arc<BufferZone>,
        desk: Arc<MaterialsDesk>,
        bathroom_addr: SocketAddr,
        breakroom_addr: SocketAddr,
    ) -> Self {
        let handle = Arc::new(AgentHandle::new(AgentKind::Worker, index));
        let pushes: crate::facility::PushHandler = {
            let handle = Arc::clone(&handle);
            Arc::new(move |push: &crate::facility::Push| handle.apply_push(push))
        };
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
            None => StdRng::from_entropy(),
        };
        Self {
            bathroom: FacilityConnection::new(
                FacilityKind::Bathroom,
                bathroom_addr,
                handle.id().clone(),
                pushes.clone(),
            ),
            breakroom: FacilityConnection::new(
                FacilityKind::Breakroom,
                breakroom_addr,
                handle.id().clone(),
                pushes,
            ),
            handle,
            orders,
            warehouse,
            workstations,
            desk,
            rng,
            production_time: config.production_time(),
            transport_time: config.transport_time(),
            request_time: config.request_time(),
            phase: Phase::Idle,
            order: None,
            materials_carried: 0,
            progress: 0,
            workstation: None,
            ticks_since_break: 0,
            current_break: None,
        }
    }

    /// Shared view of this agent's state.
    pub fn handle(&self) -> &Arc<AgentHandle> {
        &self.handle
    }

    /// One scheduling step; returns how long to sleep before the next.
    pub async fn step(&mut self) -> Duration {
        match self.phase {
            Phase::Idle => self.idle_step(),
            Phase::Traveling(destination) => self.arrive(destination).await,
            Phase::Gathering => self.gather_step(),
            Phase::Producing => self.produce_step().await,
            Phase::OnBreak => self.break_step(),
        }
    }

    /// Release everything held and close the facility sessions.
    pub async fn shutdown(&mut self) {
        self.workstation = None;
        self.bathroom.close().await;
        self.breakroom.close().await;
    }

    fn idle_step(&mut self) -> Duration {
        match self.orders.pop() {
            Some(order) => {
                info!(
                    agent = %self.handle.id(),
                    product = order.product_id,
                    quantity = order.quantity,
                    "order claimed"
                );
                self.desk.request(order.required_materials() as u64);
                self.order = Some(order);
                self.materials_carried = 0;
                self.progress = 0;
                self.travel(AgentLocation::Warehouse, "heading to the warehouse")
            }
            None => {
                self.handle.set(AgentState::Idle, "waiting for orders");
                self.request_time
            }
        }
    }

    async fn arrive(&mut self, destination: AgentLocation) -> Duration {
        match destination {
            AgentLocation::Warehouse => {
                self.handle.set_location(destination);
                self.handle.set(AgentState::Waiting, "picking up materials");
                self.phase = Phase::Gathering;
                self.request_time
            }
            AgentLocation::Factory => {
                self.handle.set_location(destination);
                if self.order.is_some() {
                    self.phase = Phase::Producing;
                    self.handle.set(AgentState::Waiting, "waiting for a workstation");
                    Duration::ZERO
                } else {
                    self.phase = Phase::Idle;
                    self.handle.set(AgentState::Idle, "back on the floor");
                    self.request_time
                }
            }
            // A facility: from here the server owns state and location.
            // Exactly one wire request per visit.
            AgentLocation::Bathroom | AgentLocation::Breakroom => {
                let kind = match destination {
                    AgentLocation::Bathroom => FacilityKind::Bathroom,
                    _ => FacilityKind::Breakroom,
                };
                let connection = match kind {
                    FacilityKind::Bathroom => &mut self.bathroom,
                    FacilityKind::Breakroom => &mut self.breakroom,
                };
                match connection.request_break().await {
                    Ok(()) => {
                        self.current_break = Some(kind);
                        self.phase = Phase::OnBreak;
                        self.handle.set_activity("taking a break");
                        self.request_time
                    }
                    Err(e) => {
                        // Facility unreachable: skip the break, go back to
                        // work rather than retry.
                        warn!(agent = %self.handle.id(), facility = %kind, error = %e,
                            "facility unreachable, skipping break");
                        self.ticks_since_break = 0;
                        self.travel(AgentLocation::Factory, "walking back early")
                    }
                }
            }
            _ => {
                self.phase = Phase::Idle;
                self.request_time
            }
        }
    }

    // At the warehouse: one take attempt per tick until the full load is
    // carried. A failed take just means the materials are not there yet.
    fn gather_step(&mut self) -> Duration {
        let Some(order) = self.order else {
            self.phase = Phase::Idle;
            return self.request_time;
        };
        if self.warehouse.try_take(order.source_slot()) {
            self.materials_carried += 1;
        }
        if self.materials_carried >= order.required_materials() {
            return self.travel(AgentLocation::Factory, "hauling materials back");
        }
        self.request_time
    }

    async fn produce_step(&mut self) -> Duration {
        let Some(order) = self.order else {
            self.phase = Phase::Idle;
            return self.request_time;
        };

        if self.workstation.is_none() {
            match self.workstations.enter().await {
                Ok(guard) => {
                    self.workstation = Some(guard);
                    self.handle.set(
                        AgentState::Working,
                        format!("producing product {}", order.product_id),
                    );
                }
                Err(_) => {
                    // Workstations closed: shutdown is underway.
                    self.phase = Phase::Idle;
                    return self.request_time;
                }
            }
        }

        self.progress += 1;
        self.ticks_since_break += 1;

        if self.progress >= order.quantity {
            self.warehouse.add(order.target_slot(), order.quantity as u64);
            self.workstation = None;
            self.order = None;
            self.materials_carried = 0;
            self.progress = 0;
            self.phase = Phase::Idle;
            self.handle.set(AgentState::Idle, "order complete");
            info!(
                agent = %self.handle.id(),
                product = order.product_id,
                quantity = order.quantity,
                "order complete"
            );
            return self.request_time;
        }

        if self.break_due() {
            // The slot goes back to the pool while the worker is away.
            self.workstation = None;
            let kind = if self.rng.gen_bool(0.5) {
                FacilityKind::Bathroom
            } else {
                FacilityKind::Breakroom
            };
            info!(agent = %self.handle.id(), facility = %kind, "break time");
            return self.travel(kind.location(), "heading out for a break");
        }

        // Heavier products take longer per unit.
        self.production_time * order.product_id as u32
    }

    // ON_BREAK is remote-controlled; locally the worker only polls for the
    // terminal event. The server's pushes have already walked state and
    // location back to the factory by the time the flag flips.
    fn break_step(&mut self) -> Duration {
        let finished = match self.current_break {
            Some(FacilityKind::Bathroom) => self.bathroom.break_finished(),
            Some(FacilityKind::Breakroom) => self.breakroom.break_finished(),
            None => true,
        };
        if finished {
            self.current_break = None;
            self.ticks_since_break = 0;
            if self.order.is_some() {
                self.phase = Phase::Producing;
                self.handle.set(AgentState::Waiting, "waiting for a workstation");
            } else {
                self.phase = Phase::Idle;
                self.handle.set(AgentState::Idle, "refreshed");
            }
        }
        self.request_time
    }

    fn break_due(&mut self) -> bool {
        if self.ticks_since_break < breaks::MIN_TICKS_BEFORE_BREAK {
            return false;
        }
        let chance = breaks::BASE_CHANCE_PCT + breaks::PER_TICK_CHANCE_PCT * self.ticks_since_break;
        self.rng.gen_range(0..100) < chance
    }

    fn travel(&mut self, destination: AgentLocation, activity: &str) -> Duration {
        self.phase = Phase::Traveling(destination);
        self.handle.set(AgentState::Moving, activity);
        self.transport_time
    }
}

impl std::fmt::Debug for WorkerAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerAgent")
            .field("id", self.handle.id())
            .field("phase", &self.phase)
            .field("order", &self.order)
            .field("materials_carried", &self.materials_carried)
            .field("progress", &self.progress)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_worker(config: &SimulationConfig) -> WorkerAgent {
        // Facility servers are not running; connections stay lazy and unused.
        let addr: SocketAddr = "127.0.0.1:1".parse().unwrap();
        WorkerAgent::new(
            0,
            config,
            Arc::new(OrderQueue::new()),
            Arc::new(Warehouse::new(config.warehouse_slots())),
            Arc::new(BufferZone::new("workstations", config.workstation_capacity)),
            Arc::new(MaterialsDesk::new()),
            addr,
            addr,
        )
    }

    fn quick_config() -> SimulationConfig {
        SimulationConfig {
            seed: Some(42),
            production_time_ms: 1,
            transport_time_ms: 1,
            request_time_ms: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_no_departure_until_all_materials_carried() {
        let config = quick_config();
        let mut worker = test_worker(&config);
        worker.warehouse.add(0, 10);
        worker.order = Some(ProductOrder::new(1, 3));
        worker.phase = Phase::Gathering;
        worker.materials_carried = 1;

        worker.gather_step();
        // Two of three is not enough to leave
        assert_eq!(worker.materials_carried, 2);
        assert_eq!(worker.phase, Phase::Gathering);

        worker.gather_step();
        assert_eq!(worker.materials_carried, 3);
        assert_eq!(worker.phase, Phase::Traveling(AgentLocation::Factory));
    }

    #[test]
    fn test_gathering_polls_through_empty_warehouse() {
        let config = quick_config();
        let mut worker = test_worker(&config);
        worker.order = Some(ProductOrder::new(1, 2));
        worker.phase = Phase::Gathering;

        worker.gather_step();
        // Nothing in stock: no progress, no transition, no error
        assert_eq!(worker.materials_carried, 0);
        assert_eq!(worker.phase, Phase::Gathering);
    }

    #[tokio::test]
    async fn test_completed_order_banks_produced_units() {
        let config = quick_config();
        let mut worker = test_worker(&config);
        worker.order = Some(ProductOrder::new(2, 2));
        worker.materials_carried = 2;
        worker.phase = Phase::Producing;

        worker.step().await;
        assert_eq!(worker.progress, 1);
        assert!(worker.workstation.is_some());

        worker.step().await;
        assert_eq!(worker.phase, Phase::Idle);
        assert!(worker.order.is_none());
        assert!(worker.workstation.is_none());
        assert_eq!(worker.warehouse.stock(2), 2);
    }

    #[tokio::test]
    async fn test_break_trigger_releases_workstation() {
        let config = quick_config();
        let mut worker = test_worker(&config);
        worker.order = Some(ProductOrder::new(1, 50));
        worker.materials_carried = 50;
        worker.phase = Phase::Producing;
        // Enough accumulated ticks that the chance exceeds 100%
        worker.ticks_since_break = 40;

        worker.step().await;
        assert!(worker.workstation.is_none());
        assert_eq!(worker.workstations.occupancy(), 0);
        assert!(matches!(
            worker.phase,
            Phase::Traveling(AgentLocation::Bathroom | AgentLocation::Breakroom)
        ));
        // The order survives the break
        assert!(worker.order.is_some());
    }

    #[tokio::test]
    async fn test_order_claim_files_materials_request() {
        let config = quick_config();
        let mut worker = test_worker(&config);
        worker.orders.push_batch([ProductOrder::new(1, 4)]);

        worker.step().await;
        assert_eq!(worker.desk.pending(), 4);
        assert_eq!(worker.phase, Phase::Traveling(AgentLocation::Warehouse));
        assert_eq!(worker.handle().state(), AgentState::Moving);
    }
}
