//! Factory orchestration
//!
//! The composition root. Builds the shared resources (warehouse, order
//! queue, workstation gate, materials desk, delivery bays), binds and serves
//! the two facility listeners, spawns one task per agent, and exposes the
//! read-only monitoring surface the display side samples. Shutdown is one
//! token: cancel it and every task winds down on its own.

use crate::agents::{
    drive, AgentHandle, AgentSnapshot, AgentTask, DeliveryAgent, DeliveryBay, InventoryAgent,
    ManagerAgent, MaterialsDesk, WorkerAgent,
};
use crate::facility::{Facility, FacilityKind, FacilityServer};
use crate::production::{OrderQueue, Warehouse};
use crate::simulation::error::SimulationResult;
use crate::types::SimulationConfig;
use crate::zones::BufferZone;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// A running simulation: shared resources, facility servers, agent tasks.
#[derive(Debug)]
pub struct FactoryOrchestrator {
    config: SimulationConfig,
    shutdown: CancellationToken,
    warehouse: Arc<Warehouse>,
    workstations: Arc<BufferZone>,
    orders: Arc<OrderQueue>,
    handles: Vec<Arc<AgentHandle>>,
    agent_tasks: Vec<JoinHandle<()>>,
    server_tasks: Vec<JoinHandle<()>>,
    bathroom_addr: SocketAddr,
    breakroom_addr: SocketAddr,
}

impl FactoryOrchestrator {
    /// Validate the configuration, bring up both facility servers, and start
    /// every agent. Returns once the floor is running.
    pub async fn start(config: SimulationConfig) -> SimulationResult<Self> {
        config.validate()?;

        let shutdown = CancellationToken::new();
        let warehouse = Arc::new(Warehouse::new(config.warehouse_slots()));
        let workstations =
            Arc::new(BufferZone::new("workstations", config.workstation_capacity));
        let orders = Arc::new(OrderQueue::new());
        let desk = Arc::new(MaterialsDesk::new());
        let walk = Duration::from_millis(config.facility_walk_ms);

        let mut server_tasks = Vec::new();
        let (bathroom_addr, bathroom_task) = spawn_facility(
            FacilityKind::Bathroom,
            config.bathroom_port,
            config.bathroom_capacity,
            Duration::from_millis(config.bathroom_dwell_ms),
            walk,
            &shutdown,
        )
        .await?;
        server_tasks.push(bathroom_task);
        let (breakroom_addr, breakroom_task) = spawn_facility(
            FacilityKind::Breakroom,
            config.breakroom_port,
            config.breakroom_capacity,
            Duration::from_millis(config.breakroom_dwell_ms),
            walk,
            &shutdown,
        )
        .await?;
        server_tasks.push(breakroom_task);

        let mut handles = Vec::new();
        let mut agent_tasks = Vec::new();
        let mut spawn_agent = |task: AgentTask| {
            handles.push(Arc::clone(task.handle()));
            agent_tasks.push(tokio::spawn(drive(task, shutdown.clone())));
        };

        spawn_agent(AgentTask::Manager(ManagerAgent::new(&config, Arc::clone(&orders))));

        let mut bays = Vec::new();
        for index in 0..config.delivery_agents {
            let bay = Arc::new(DeliveryBay::new(index));
            bays.push(Arc::clone(&bay));
            spawn_agent(AgentTask::Delivery(DeliveryAgent::new(
                index,
                &config,
                bay,
                Arc::clone(&warehouse),
            )));
        }

        spawn_agent(AgentTask::Inventory(InventoryAgent::new(
            &config,
            Arc::clone(&desk),
            bays,
        )));

        for index in 0..config.workers {
            spawn_agent(AgentTask::Worker(WorkerAgent::new(
                index,
                &config,
                Arc::clone(&orders),
                Arc::clone(&warehouse),
                Arc::clone(&workstations),
                Arc::clone(&desk),
                bathroom_addr,
                breakroom_addr,
            )));
        }

        info!(
            workers = config.workers,
            delivery_agents = config.delivery_agents,
            workstations = config.workstation_capacity,
            bathroom = %bathroom_addr,
            breakroom = %breakroom_addr,
            "factory floor running"
        );

        Ok(Self {
            config,
            shutdown,
            warehouse,
            workstations,
            orders,
            handles,
            agent_tasks,
            server_tasks,
            bathroom_addr,
            breakroom_addr,
        })
    }

    /// The merged configuration this run was started with.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Address the bathroom server is listening on.
    pub fn bathroom_addr(&self) -> SocketAddr {
        self.bathroom_addr
    }

    /// Address the breakroom server is listening on.
    pub fn breakroom_addr(&self) -> SocketAddr {
        self.breakroom_addr
    }

    /// Snapshot every agent for display. Read-only sampling; agents are
    /// never blocked beyond one handle lock each.
    pub fn agent_snapshots(&self) -> Vec<AgentSnapshot> {
        self.handles.iter().map(|handle| handle.snapshot()).collect()
    }

    /// Ordered warehouse counters: slot 0 raw materials, then one slot per
    /// product.
    pub fn stock_levels(&self) -> Vec<u64> {
        self.warehouse.stock_levels()
    }

    /// Workstation gate usage as (occupied, capacity).
    pub fn workstation_occupancy(&self) -> (usize, usize) {
        (self.workstations.occupancy(), self.workstations.capacity())
    }

    /// Orders waiting in the queue.
    pub fn orders_outstanding(&self) -> usize {
        self.orders.len()
    }

    /// Stop the simulation: cancel the shutdown token, unblock every gate,
    /// and wait for all agent and server tasks to finish.
    pub async fn shutdown(self) {
        info!("shutting down the floor");
        self.shutdown.cancel();
        self.workstations.close();

        for task in self.agent_tasks {
            let _ = task.await;
        }
        for task in self.server_tasks {
            let _ = task.await;
        }
        info!("factory floor stopped");
    }
}

async fn spawn_facility(
    kind: FacilityKind,
    port: u16,
    capacity: usize,
    dwell: Duration,
    walk: Duration,
    shutdown: &CancellationToken,
) -> SimulationResult<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    let addr = listener.local_addr()?;
    let facility = Arc::new(Facility::new(kind, capacity, dwell, walk));
    let server = FacilityServer::new(facility, shutdown.child_token());
    let task = tokio::spawn(server.serve(listener));
    Ok((addr, task))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AgentKind, AgentState};

    fn quick_config() -> SimulationConfig {
        SimulationConfig {
            workers: 2,
            delivery_agents: 1,
            bathroom_port: 0,
            breakroom_port: 0,
            production_time_ms: 5,
            transport_time_ms: 5,
            request_time_ms: 5,
            bathroom_dwell_ms: 10,
            breakroom_dwell_ms: 10,
            facility_walk_ms: 2,
            seed: Some(1),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_start_spawns_full_crew() {
        let orchestrator = FactoryOrchestrator::start(quick_config()).await.unwrap();

        let snapshots = orchestrator.agent_snapshots();
        // 1 manager + 1 delivery + 1 inventory + 2 workers
        assert_eq!(snapshots.len(), 5);
        assert_eq!(snapshots.iter().filter(|s| s.kind == AgentKind::Worker).count(), 2);
        assert_eq!(snapshots.iter().filter(|s| s.kind == AgentKind::Manager).count(), 1);

        // Slot 0 plus one per product
        assert_eq!(orchestrator.stock_levels().len(), 6);
        assert_eq!(orchestrator.workstation_occupancy().1, 2);

        orchestrator.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_ends_every_shift() {
        let orchestrator = FactoryOrchestrator::start(quick_config()).await.unwrap();
        let handles = orchestrator.handles.clone();

        // Let the floor actually do something first.
        tokio::time::sleep(Duration::from_millis(50)).await;
        orchestrator.shutdown().await;

        for handle in handles {
            assert_eq!(handle.state(), AgentState::ShiftEnded);
        }
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let config = SimulationConfig { workers: 0, ..quick_config() };
        assert!(FactoryOrchestrator::start(config).await.is_err());
    }
}
