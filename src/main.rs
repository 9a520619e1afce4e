// Factory Floor Simulator - Main Entry Point
//
// You can run it via Cargo:
//
// ```console
// $ cargo build --release
// $ ./target/release/factory-floor-sim
// ```
//
// Or with custom configuration:
//
// ```console
// $ ./target/release/factory-floor-sim --workers 20 --workstation-capacity 4 --verbose
// ```

use clap::Parser;
use factory_floor_sim::simulation::{FactoryOrchestrator, LoggingConfig, SimulationResult};
use factory_floor_sim::types::{AgentState, CliArgs, SimulationConfig};
use std::process;
use std::time::Duration;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse CLI arguments first to check for special flags
    let args = CliArgs::parse();

    if args.print_config {
        match SimulationConfig::default().print_json() {
            Ok(json) => {
                println!("{}", json);
                return;
            }
            Err(e) => {
                eprintln!("Failed to serialize default configuration: {}", e);
                process::exit(1);
            }
        }
    }

    // Initialize logging based on CLI flags
    let logging_result = if args.debug {
        LoggingConfig::init_debug()
    } else if args.verbose {
        LoggingConfig::init_verbose()
    } else {
        LoggingConfig::new().with_level(tracing::Level::INFO).init()
    };
    if let Err(e) = logging_result {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("Starting Factory Floor Simulator");

    // Load configuration from CLI arguments and optional config file
    let config = match SimulationConfig::from_cli_args(args.clone()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        process::exit(1);
    }

    if args.dry_run {
        eprintln!("Configuration validation successful!");
        eprintln!("Dry run mode - simulation will not be executed.");
        print_configuration_summary(&config);
        return;
    }

    print_startup_banner(&config);

    if let Err(e) = run_simulation(config).await {
        error!("Simulation failed: {}", e);
        process::exit(1);
    }

    info!("Factory Floor Simulator stopped");
}

/// Run the floor until interrupted, reporting status at the configured
/// interval.
async fn run_simulation(config: SimulationConfig) -> SimulationResult<()> {
    let status_interval = config.status_interval_secs;
    let orchestrator = FactoryOrchestrator::start(config).await?;
    eprintln!("Factory floor running - press Ctrl-C to end the shift");

    if status_interval > 0 {
        let mut ticker = tokio::time::interval(Duration::from_secs(status_interval));
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                _ = ticker.tick() => report_status(&orchestrator),
            }
        }
    } else {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("Interrupt received, ending the shift");
    orchestrator.shutdown().await;
    Ok(())
}

/// Log one status line: the stand-in for the excluded display windows.
fn report_status(orchestrator: &FactoryOrchestrator) {
    let snapshots = orchestrator.agent_snapshots();
    let count_in = |state: AgentState| snapshots.iter().filter(|s| s.state == state).count();
    let (occupied, capacity) = orchestrator.workstation_occupancy();

    info!(
        agents = snapshots.len(),
        working = count_in(AgentState::Working),
        waiting = count_in(AgentState::Waiting),
        moving = count_in(AgentState::Moving),
        on_break = count_in(AgentState::OnBreak),
        workstations = format!("{}/{}", occupied, capacity),
        orders_outstanding = orchestrator.orders_outstanding(),
        stock = ?orchestrator.stock_levels(),
        "floor status"
    );
}

/// Print startup banner and configuration summary
fn print_startup_banner(config: &SimulationConfig) {
    eprintln!("Factory Floor Simulator");
    eprintln!("=======================");
    eprintln!("Concurrent agents, shared zones, socket-controlled break facilities");
    eprintln!();
    print_configuration_summary(config);
}

/// Print configuration summary
fn print_configuration_summary(config: &SimulationConfig) {
    eprintln!("Configuration:");
    eprintln!("  Workers: {}", config.workers);
    eprintln!("  Delivery Agents: {}", config.delivery_agents);
    eprintln!("  Workstation Capacity: {}", config.workstation_capacity);
    eprintln!("  Products: {} (warehouse slots: {})", config.product_count, config.warehouse_slots());
    eprintln!("  Order Batch Size: {}", config.order_batch_size);
    eprintln!("  Truck Capacity: {}", config.truck_capacity);
    eprintln!(
        "  Timings (ms): production {} / transport {} / request {}",
        config.production_time_ms, config.transport_time_ms, config.request_time_ms
    );
    eprintln!(
        "  Bathroom: capacity {}, dwell {} ms, port {}",
        config.bathroom_capacity, config.bathroom_dwell_ms, config.bathroom_port
    );
    eprintln!(
        "  Breakroom: capacity {}, dwell {} ms, port {}",
        config.breakroom_capacity, config.breakroom_dwell_ms, config.breakroom_port
    );
    if let Some(seed) = config.seed {
        eprintln!("  Random Seed: {}", seed);
    }
    eprintln!();
}
