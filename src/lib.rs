//! Factory Floor Simulator
//!
//! Simulates a factory floor as a population of independent concurrent
//! agents (workers, a manager, an inventory dispatcher, delivery drivers)
//! competing for bounded shared resources: workstations, a shared warehouse,
//! and two off-site break facilities (bathroom, breakroom) that run as
//! in-process TCP servers the agents talk to over a line-oriented text
//! protocol.
//!
//! # Overview
//!
//! The manager keeps a FIFO order queue stocked. Workers claim orders, file
//! material requests, haul raw materials over from the warehouse, and hold a
//! capacity-bounded workstation slot while producing. The inventory
//! dispatcher turns pending material requests into restock runs for the
//! delivery drivers, who shuttle stock from the supplier into the warehouse.
//! Working agents periodically detour through a facility: they request entry
//! over the wire, and the facility server owns their state and location
//! until the visit completes.
//!
//! ## Key pieces
//!
//! - **Admission gates** ([`zones::BufferZone`]): fair capacity-bounded
//!   entry, used for workstations locally and room capacity inside each
//!   facility server, with RAII release on every exit path
//! - **Warehouse** ([`production::Warehouse`]): per-slot counters with
//!   atomic check-and-decrement takes; a failed take is a normal signal
//! - **Wire protocol** ([`facility::protocol`]): a closed vocabulary of
//!   commands and pushes, parsed once at the connection boundary
//! - **Agent machines** ([`agents`]): a closed variant set sharing one
//!   step/sleep drive loop, with cooperative cancellation as end-of-shift
//! - **Orchestration** ([`simulation::FactoryOrchestrator`]): composition
//!   root plus the read-only monitoring surface
//!
//! ## Quick start
//!
//! ```no_run
//! use factory_floor_sim::simulation::FactoryOrchestrator;
//! use factory_floor_sim::types::SimulationConfig;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SimulationConfig { workers: 4, ..Default::default() };
//! let orchestrator = FactoryOrchestrator::start(config).await?;
//!
//! // Sample the floor, then stop it.
//! for snapshot in orchestrator.agent_snapshots() {
//!     println!("{} is {}", snapshot.id, snapshot.state);
//! }
//! orchestrator.shutdown().await;
//! # Ok(())
//! # }
//! ```
#![warn(missing_docs, missing_debug_implementations, unreachable_pub)]

// Module declarations
pub mod agents;
pub mod facility;
pub mod production;
pub mod simulation;
pub mod types;
pub mod zones;

// Core types and identifiers
pub use types::{
    AgentId, AgentKind, AgentLocation, AgentState, CliArgs, ConfigValidationError,
    SimulationConfig,
};

// Shared resources
pub use production::{OrderQueue, ProductOrder, Warehouse};
pub use zones::{BufferZone, ZoneClosed, ZoneGuard};

// Facility protocol and endpoints
pub use facility::{
    Command, EventToken, Facility, FacilityConnection, FacilityKind, FacilityServer, Push,
};

// Agents and orchestration
pub use agents::{AgentHandle, AgentSnapshot, AgentTask};
pub use simulation::{FactoryOrchestrator, LoggingConfig, SimulationError, SimulationResult};
