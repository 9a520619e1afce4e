//! Core types for the factory floor simulator
//!
//! Contains the shared enumerations, agent identifiers, and configuration
//! structures used throughout the simulation.

pub mod config;
pub mod enums;
pub mod identifiers;

pub use config::{
    breaks, orders, CliArgs, ConfigError, ConfigFile, ConfigValidationError, SimulationConfig,
};
pub use enums::{AgentKind, AgentLocation, AgentState};
pub use identifiers::AgentId;
