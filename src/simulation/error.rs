//! Error types and handling
//!
//! Simulation-level error taxonomy. Most runtime conditions in the core are
//! not errors at all: a failed warehouse take is a normal "not yet" signal, a
//! malformed protocol line is answered on the wire, and cancellation is a
//! shutdown request. What remains here is what the orchestrator and the
//! binary can actually fail on.

use crate::types::{ConfigError, ConfigValidationError};
use thiserror::Error;

/// Errors that can occur while building or running a simulation
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    ConfigurationError(#[from] ConfigError),

    /// Configuration loaded but failed validation
    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ConfigValidationError),

    /// A facility server could not be set up
    #[error("Facility error: {0}")]
    FacilityError(String),

    /// I/O error (sockets, files)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Orchestration failure outside the categories above
    #[error("Orchestration error: {0}")]
    OrchestrationError(String),
}

impl From<anyhow::Error> for SimulationError {
    fn from(error: anyhow::Error) -> Self {
        SimulationError::OrchestrationError(error.to_string())
    }
}

impl SimulationError {
    /// Create a facility error
    pub fn facility_error(msg: impl Into<String>) -> Self {
        Self::FacilityError(msg.into())
    }

    /// Create an orchestration error
    pub fn orchestration_error(msg: impl Into<String>) -> Self {
        Self::OrchestrationError(msg.into())
    }

    /// Whether the simulation can keep running past this error
    pub fn is_recoverable(&self) -> bool {
        match self {
            SimulationError::ConfigurationError(_) => false,
            SimulationError::ValidationError(_) => false,
            SimulationError::FacilityError(_) => false,
            SimulationError::IoError(_) => true,
            SimulationError::SerializationError(_) => true,
            SimulationError::OrchestrationError(_) => false,
        }
    }

    /// Get the error category
    pub fn category(&self) -> &'static str {
        match self {
            SimulationError::ConfigurationError(_) => "Configuration",
            SimulationError::ValidationError(_) => "Validation",
            SimulationError::FacilityError(_) => "Facility",
            SimulationError::IoError(_) => "IO",
            SimulationError::SerializationError(_) => "Serialization",
            SimulationError::OrchestrationError(_) => "Orchestration",
        }
    }
}

/// Result type for simulation operations
pub type SimulationResult<T> = Result<T, SimulationError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_creation_and_display() {
        let facility = SimulationError::facility_error("bind failed");
        assert!(matches!(facility, SimulationError::FacilityError(_)));
        assert_eq!(facility.to_string(), "Facility error: bind failed");

        let orchestration = SimulationError::orchestration_error("no agents");
        assert_eq!(orchestration.category(), "Orchestration");
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::AddrInUse, "port taken");
        let sim_error: SimulationError = io_error.into();
        assert!(matches!(sim_error, SimulationError::IoError(_)));
        assert!(sim_error.is_recoverable());
    }

    #[test]
    fn test_config_errors_are_fatal() {
        let error: SimulationError =
            ConfigValidationError::ZeroCount { field: "workers" }.into();
        assert!(!error.is_recoverable());
        assert_eq!(error.category(), "Validation");
    }
}
