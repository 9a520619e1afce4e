//! Configuration structures for the factory floor simulator
//!
//! Configuration is layered: built-in defaults, then an optional JSON
//! configuration file, then command line arguments, with later layers taking
//! precedence. All knobs are plain integers supplied at startup; the core
//! consumes the merged [`SimulationConfig`] and never re-reads it.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Break-taking tuning constants
pub mod breaks {
    /// Minimum number of working ticks before a break can trigger
    pub const MIN_TICKS_BEFORE_BREAK: u32 = 2;

    /// Base percent chance of a break once eligible
    pub const BASE_CHANCE_PCT: u32 = 3;

    /// Additional percent chance per tick worked since the last break
    pub const PER_TICK_CHANCE_PCT: u32 = 3;

    /// Ticks the manager spends on a desk break (no facility trip)
    pub const MANAGER_BREAK_TICKS: u32 = 4;
}

/// Order-drafting tuning constants
pub mod orders {
    /// Largest per-order quantity the manager will draft
    pub const MAX_QUANTITY: u32 = 5;
}

/// Command line arguments structure
#[derive(Debug, Clone, Parser)]
#[command(
    name = "factory-floor-sim",
    version,
    about = "Factory floor simulator - concurrent agents, shared zones, socket-controlled break facilities",
    long_about = "Simulates a factory floor as a population of concurrent agents (workers, a \
manager, an inventory dispatcher, delivery drivers) competing for bounded shared resources. \
Break facilities (bathroom, breakroom) run as in-process TCP servers the agents talk to over a \
line-oriented text protocol.

EXAMPLES:
    # Run with default settings
    factory-floor-sim

    # Use a configuration file
    factory-floor-sim --config factory.json

    # Override specific settings
    factory-floor-sim --workers 20 --delivery-agents 5 --workstation-capacity 4

    # Generate a configuration template
    factory-floor-sim --print-config > factory.json

    # Validate configuration without running
    factory-floor-sim --config factory.json --dry-run

CONFIGURATION:
    Configuration can be provided via:
    1. Command line arguments (highest priority)
    2. Configuration file (--config flag, JSON)
    3. Default values (lowest priority)"
)]
pub struct CliArgs {
    /// Configuration file path (JSON format)
    #[arg(short, long, help = "Configuration file path (JSON format)")]
    pub config: Option<String>,

    /// Number of worker agents
    #[arg(long, help = "Number of worker agents")]
    pub workers: Option<usize>,

    /// Number of delivery agents
    #[arg(long, help = "Number of delivery agents")]
    pub delivery_agents: Option<usize>,

    /// Maximum units one delivery truck can carry
    #[arg(long, help = "Maximum units one delivery truck can carry")]
    pub truck_capacity: Option<u32>,

    /// Number of orders the manager enqueues per refill
    #[arg(long, help = "Orders enqueued per manager refill")]
    pub order_batch_size: Option<usize>,

    /// Number of distinct product types
    #[arg(long, help = "Number of distinct product types")]
    pub product_count: Option<usize>,

    /// Number of agents that can occupy workstations simultaneously
    #[arg(long, help = "Workstation capacity (concurrent producers)")]
    pub workstation_capacity: Option<usize>,

    /// Base time to produce one unit, in milliseconds
    #[arg(long, help = "Base time to produce one unit (ms)")]
    pub production_time_ms: Option<u64>,

    /// Time to travel between zones, in milliseconds
    #[arg(long, help = "Time to travel between zones (ms)")]
    pub transport_time_ms: Option<u64>,

    /// Time per material request/handling step, in milliseconds
    #[arg(long, help = "Time per material request/handling step (ms)")]
    pub request_time_ms: Option<u64>,

    /// Bathroom room capacity
    #[arg(long, help = "Bathroom room capacity")]
    pub bathroom_capacity: Option<usize>,

    /// Bathroom dwell time, in milliseconds
    #[arg(long, help = "Bathroom dwell time (ms)")]
    pub bathroom_dwell_ms: Option<u64>,

    /// Bathroom server port (0 = ephemeral)
    #[arg(long, help = "Bathroom server port (0 = ephemeral)")]
    pub bathroom_port: Option<u16>,

    /// Breakroom room capacity
    #[arg(long, help = "Breakroom room capacity")]
    pub breakroom_capacity: Option<usize>,

    /// Breakroom dwell time, in milliseconds
    #[arg(long, help = "Breakroom dwell time (ms)")]
    pub breakroom_dwell_ms: Option<u64>,

    /// Breakroom server port (0 = ephemeral)
    #[arg(long, help = "Breakroom server port (0 = ephemeral)")]
    pub breakroom_port: Option<u16>,

    /// Walk-in/walk-out time inside a facility, in milliseconds
    #[arg(long, help = "Walk-in/walk-out time inside a facility (ms)")]
    pub facility_walk_ms: Option<u64>,

    /// Random seed for reproducible runs
    #[arg(long, help = "Random seed for reproducible runs")]
    pub seed: Option<u64>,

    /// Interval between status reports, in seconds (0 disables)
    #[arg(long, help = "Interval between status reports in seconds (0 disables)")]
    pub status_interval_secs: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long, help = "Enable debug logging")]
    pub debug: bool,

    /// Validate configuration without running the simulation
    #[arg(long, help = "Validate configuration without running the simulation")]
    pub dry_run: bool,

    /// Print default configuration in JSON format and exit
    #[arg(long, help = "Print default configuration in JSON format and exit")]
    pub print_config: bool,
}

/// Configuration file structure (allows partial configuration)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    /// Number of worker agents
    pub workers: Option<usize>,
    /// Number of delivery agents
    pub delivery_agents: Option<usize>,
    /// Maximum units one delivery truck can carry
    pub truck_capacity: Option<u32>,
    /// Number of orders the manager enqueues per refill
    pub order_batch_size: Option<usize>,
    /// Number of distinct product types
    pub product_count: Option<usize>,
    /// Workstation capacity
    pub workstation_capacity: Option<usize>,
    /// Base time to produce one unit, in milliseconds
    pub production_time_ms: Option<u64>,
    /// Time to travel between zones, in milliseconds
    pub transport_time_ms: Option<u64>,
    /// Time per material request/handling step, in milliseconds
    pub request_time_ms: Option<u64>,
    /// Bathroom room capacity
    pub bathroom_capacity: Option<usize>,
    /// Bathroom dwell time, in milliseconds
    pub bathroom_dwell_ms: Option<u64>,
    /// Bathroom server port
    pub bathroom_port: Option<u16>,
    /// Breakroom room capacity
    pub breakroom_capacity: Option<usize>,
    /// Breakroom dwell time, in milliseconds
    pub breakroom_dwell_ms: Option<u64>,
    /// Breakroom server port
    pub breakroom_port: Option<u16>,
    /// Walk-in/walk-out time inside a facility, in milliseconds
    pub facility_walk_ms: Option<u64>,
    /// Random seed for reproducible runs
    pub seed: Option<u64>,
    /// Interval between status reports, in seconds
    pub status_interval_secs: Option<u64>,
}

/// Merged configuration for one simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of worker agents
    pub workers: usize,
    /// Number of delivery agents
    pub delivery_agents: usize,
    /// Maximum units one delivery truck can carry
    pub truck_capacity: u32,
    /// Number of orders the manager enqueues per refill
    pub order_batch_size: usize,
    /// Number of distinct product types (product ids run 1..=product_count)
    pub product_count: usize,
    /// Number of agents that can occupy workstations simultaneously
    pub workstation_capacity: usize,
    /// Base time to produce one unit, in milliseconds
    pub production_time_ms: u64,
    /// Time to travel between zones, in milliseconds
    pub transport_time_ms: u64,
    /// Time per material request/handling step, in milliseconds
    pub request_time_ms: u64,
    /// Bathroom room capacity
    pub bathroom_capacity: usize,
    /// Bathroom dwell time, in milliseconds
    pub bathroom_dwell_ms: u64,
    /// Bathroom server port (0 = ephemeral)
    pub bathroom_port: u16,
    /// Breakroom room capacity
    pub breakroom_capacity: usize,
    /// Breakroom dwell time, in milliseconds
    pub breakroom_dwell_ms: u64,
    /// Breakroom server port (0 = ephemeral)
    pub breakroom_port: u16,
    /// Walk-in/walk-out time inside a facility, in milliseconds
    pub facility_walk_ms: u64,
    /// Random seed for reproducible runs
    pub seed: Option<u64>,
    /// Interval between status reports, in seconds (0 disables)
    pub status_interval_secs: u64,
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Configuration file read error
    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    /// JSON parsing error
    #[error("Failed to parse JSON configuration: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Unsupported configuration file format
    #[error("Unsupported configuration file format: {0} (supported: .json)")]
    UnsupportedFormat(String),
}

/// Validation errors for simulation configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    /// A count that must be positive is zero
    #[error("{field} must be greater than 0")]
    ZeroCount {
        /// Name of the offending field
        field: &'static str,
    },

    /// A duration that must be positive is zero
    #[error("{field} must be greater than 0 ms")]
    ZeroDuration {
        /// Name of the offending field
        field: &'static str,
    },

    /// Both facility servers were given the same fixed port
    #[error("bathroom and breakroom cannot share port {0}")]
    PortCollision(u16),
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            delivery_agents: 3,
            truck_capacity: 20,
            order_batch_size: 10,
            product_count: 5,
            workstation_capacity: 2,
            production_time_ms: 500,
            transport_time_ms: 5_000,
            request_time_ms: 500,
            bathroom_capacity: 5,
            bathroom_dwell_ms: 5_000,
            bathroom_port: 5_000,
            breakroom_capacity: 10,
            breakroom_dwell_ms: 10_000,
            breakroom_port: 5_001,
            facility_walk_ms: 1_000,
            seed: None,
            status_interval_secs: 5,
        }
    }
}

impl SimulationConfig {
    /// Create configuration from parsed CLI arguments and an optional file.
    pub fn from_cli_args(args: CliArgs) -> Result<Self, ConfigError> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_cli_overrides(args);
        Ok(config)
    }

    /// Load configuration from a JSON file, merging with defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                let file: ConfigFile = serde_json::from_str(&content)?;
                Ok(Self::from_config_file(file))
            }
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => Err(ConfigError::UnsupportedFormat("no extension".to_string())),
        }
    }

    fn from_config_file(file: ConfigFile) -> Self {
        let d = Self::default();
        Self {
            workers: file.workers.unwrap_or(d.workers),
            delivery_agents: file.delivery_agents.unwrap_or(d.delivery_agents),
            truck_capacity: file.truck_capacity.unwrap_or(d.truck_capacity),
            order_batch_size: file.order_batch_size.unwrap_or(d.order_batch_size),
            product_count: file.product_count.unwrap_or(d.product_count),
            workstation_capacity: file.workstation_capacity.unwrap_or(d.workstation_capacity),
            production_time_ms: file.production_time_ms.unwrap_or(d.production_time_ms),
            transport_time_ms: file.transport_time_ms.unwrap_or(d.transport_time_ms),
            request_time_ms: file.request_time_ms.unwrap_or(d.request_time_ms),
            bathroom_capacity: file.bathroom_capacity.unwrap_or(d.bathroom_capacity),
            bathroom_dwell_ms: file.bathroom_dwell_ms.unwrap_or(d.bathroom_dwell_ms),
            bathroom_port: file.bathroom_port.unwrap_or(d.bathroom_port),
            breakroom_capacity: file.breakroom_capacity.unwrap_or(d.breakroom_capacity),
            breakroom_dwell_ms: file.breakroom_dwell_ms.unwrap_or(d.breakroom_dwell_ms),
            breakroom_port: file.breakroom_port.unwrap_or(d.breakroom_port),
            facility_walk_ms: file.facility_walk_ms.unwrap_or(d.facility_walk_ms),
            seed: file.seed.or(d.seed),
            status_interval_secs: file.status_interval_secs.unwrap_or(d.status_interval_secs),
        }
    }

    fn apply_cli_overrides(&mut self, args: CliArgs) {
        macro_rules! override_field {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = args.$field {
                    self.$field = value;
                })*
            };
        }
        override_field!(
            workers,
            delivery_agents,
            truck_capacity,
            order_batch_size,
            product_count,
            workstation_capacity,
            production_time_ms,
            transport_time_ms,
            request_time_ms,
            bathroom_capacity,
            bathroom_dwell_ms,
            bathroom_port,
            breakroom_capacity,
            breakroom_dwell_ms,
            breakroom_port,
            facility_walk_ms,
            status_interval_secs,
        );
        if let Some(seed) = args.seed {
            self.seed = Some(seed);
        }
    }

    /// Print configuration as pretty JSON.
    pub fn print_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Save configuration to a JSON file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let counts: [(&'static str, usize); 8] = [
            ("workers", self.workers),
            ("delivery_agents", self.delivery_agents),
            ("truck_capacity", self.truck_capacity as usize),
            ("order_batch_size", self.order_batch_size),
            ("product_count", self.product_count),
            ("workstation_capacity", self.workstation_capacity),
            ("bathroom_capacity", self.bathroom_capacity),
            ("breakroom_capacity", self.breakroom_capacity),
        ];
        for (field, value) in counts {
            if value == 0 {
                return Err(ConfigValidationError::ZeroCount { field });
            }
        }

        let durations: [(&'static str, u64); 5] = [
            ("production_time_ms", self.production_time_ms),
            ("transport_time_ms", self.transport_time_ms),
            ("request_time_ms", self.request_time_ms),
            ("bathroom_dwell_ms", self.bathroom_dwell_ms),
            ("breakroom_dwell_ms", self.breakroom_dwell_ms),
        ];
        for (field, value) in durations {
            if value == 0 {
                return Err(ConfigValidationError::ZeroDuration { field });
            }
        }

        if self.bathroom_port != 0 && self.bathroom_port == self.breakroom_port {
            return Err(ConfigValidationError::PortCollision(self.bathroom_port));
        }

        Ok(())
    }

    /// Base production time as a [`Duration`].
    pub fn production_time(&self) -> Duration {
        Duration::from_millis(self.production_time_ms)
    }

    /// Zone-to-zone travel time as a [`Duration`].
    pub fn transport_time(&self) -> Duration {
        Duration::from_millis(self.transport_time_ms)
    }

    /// Material request/handling step time as a [`Duration`].
    pub fn request_time(&self) -> Duration {
        Duration::from_millis(self.request_time_ms)
    }

    /// Warehouse slot count: slot 0 holds raw material, slots 1..=product_count
    /// hold finished products.
    pub fn warehouse_slots(&self) -> usize {
        self.product_count + 1
    }
}
