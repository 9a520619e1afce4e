//! Agent machines
//!
//! The four agent roles form a closed variant set sharing one drive loop:
//! step, sleep the duration the step asked for, repeat. A step never runs
//! concurrently with another step of the same agent; different agents run as
//! independent tasks. Cancellation observed at any await is a clean end of
//! shift, never an error.

pub mod delivery;
pub mod handle;
pub mod inventory;
pub mod manager;
pub mod worker;

pub use delivery::{DeliveryAgent, DeliveryBay};
pub use handle::{AgentHandle, AgentSnapshot};
pub use inventory::{InventoryAgent, MaterialsDesk};
pub use manager::ManagerAgent;
pub use worker::WorkerAgent;

use crate::types::AgentState;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// The closed set of agent machines driven by [`drive`].
#[derive(Debug)]
pub enum AgentTask {
    /// Production worker
    Worker(WorkerAgent),
    /// Order queue manager
    Manager(ManagerAgent),
    /// Materials dispatcher
    Inventory(InventoryAgent),
    /// Restock driver
    Delivery(DeliveryAgent),
}

impl AgentTask {
    /// Shared view of the wrapped agent's state.
    pub fn handle(&self) -> &Arc<AgentHandle> {
        match self {
            AgentTask::Worker(agent) => agent.handle(),
            AgentTask::Manager(agent) => agent.handle(),
            AgentTask::Inventory(agent) => agent.handle(),
            AgentTask::Delivery(agent) => agent.handle(),
        }
    }

    async fn step(&mut self) -> Duration {
        match self {
            AgentTask::Worker(agent) => agent.step().await,
            AgentTask::Manager(agent) => agent.step(),
            AgentTask::Inventory(agent) => agent.step(),
            AgentTask::Delivery(agent) => agent.step().await,
        }
    }

    async fn shutdown(&mut self) {
        if let AgentTask::Worker(agent) = self {
            agent.shutdown().await;
        }
    }
}

/// Run one agent until the shutdown token fires, then wind it down.
///
/// The token is checked at both await points, so a blocked step (gate wait,
/// bay wait, facility poll) unwinds promptly. Held zone guards release on
/// drop; the worker additionally closes its facility sessions.
pub async fn drive(mut task: AgentTask, shutdown: CancellationToken) {
    let id = task.handle().id().clone();
    info!(agent = %id, "shift started");

    loop {
        let pause = tokio::select! {
            _ = shutdown.cancelled() => break,
            pause = task.step() => pause,
        };
        if !pause.is_zero() {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = sleep(pause) => {}
            }
        }
    }

    task.handle().set(AgentState::EndingShift, "clocking out");
    task.shutdown().await;
    task.handle().set(AgentState::ShiftEnded, "shift ended");
    info!(agent = %id, "shift ended");
}
