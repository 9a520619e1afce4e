//! Simulation control: errors, logging, and the orchestrator.

pub mod error;
pub mod logging;
pub mod orchestrator;

pub use error::{SimulationError, SimulationResult};
pub use logging::LoggingConfig;
pub use orchestrator::FactoryOrchestrator;
