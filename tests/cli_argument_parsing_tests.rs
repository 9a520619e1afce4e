//! Integration tests for CLI parsing and configuration layering

use clap::Parser;
use factory_floor_sim::types::{CliArgs, ConfigError, SimulationConfig};
use std::io::Write;

fn parse(args: &[&str]) -> CliArgs {
    CliArgs::try_parse_from(std::iter::once("factory-floor-sim").chain(args.iter().copied()))
        .expect("arguments should parse")
}

/// Bare invocation yields the built-in defaults.
#[test]
fn test_defaults_without_arguments() {
    let config = SimulationConfig::from_cli_args(parse(&[])).unwrap();
    let defaults = SimulationConfig::default();
    assert_eq!(config.workers, defaults.workers);
    assert_eq!(config.workstation_capacity, defaults.workstation_capacity);
    assert_eq!(config.bathroom_port, defaults.bathroom_port);
    assert!(config.validate().is_ok());
}

/// CLI flags override the defaults field by field.
#[test]
fn test_cli_overrides_defaults() {
    let args = parse(&[
        "--workers",
        "20",
        "--workstation-capacity",
        "4",
        "--seed",
        "42",
        "--bathroom-port",
        "0",
    ]);
    let config = SimulationConfig::from_cli_args(args).unwrap();
    assert_eq!(config.workers, 20);
    assert_eq!(config.workstation_capacity, 4);
    assert_eq!(config.seed, Some(42));
    assert_eq!(config.bathroom_port, 0);
    // Untouched fields keep their defaults
    assert_eq!(config.delivery_agents, SimulationConfig::default().delivery_agents);
}

/// File settings beat defaults, CLI flags beat the file.
#[test]
fn test_cli_beats_file_beats_defaults() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(file, r#"{{ "workers": 7, "truck_capacity": 50 }}"#).unwrap();

    let path = file.path().to_str().unwrap();
    let args = parse(&["--config", path, "--workers", "3"]);
    let config = SimulationConfig::from_cli_args(args).unwrap();

    assert_eq!(config.workers, 3); // CLI wins
    assert_eq!(config.truck_capacity, 50); // file wins over default
    assert_eq!(config.product_count, SimulationConfig::default().product_count);
}

/// Missing files and non-JSON extensions are reported, not ignored.
#[test]
fn test_config_file_errors() {
    let missing = SimulationConfig::from_cli_args(parse(&["--config", "/no/such/file.json"]));
    assert!(matches!(missing, Err(ConfigError::FileNotFound(_))));

    let mut yaml = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    write!(yaml, "workers: 7").unwrap();
    let unsupported =
        SimulationConfig::from_cli_args(parse(&["--config", yaml.path().to_str().unwrap()]));
    assert!(matches!(unsupported, Err(ConfigError::UnsupportedFormat(_))));

    let mut garbage = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(garbage, "{{ not json").unwrap();
    let invalid =
        SimulationConfig::from_cli_args(parse(&["--config", garbage.path().to_str().unwrap()]));
    assert!(matches!(invalid, Err(ConfigError::JsonError(_))));
}

/// --print-config output feeds straight back in as a config file.
#[test]
fn test_printed_config_round_trips_through_file() {
    let json = SimulationConfig::default().print_json().unwrap();
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(file, "{}", json).unwrap();

    let config =
        SimulationConfig::from_cli_args(parse(&["--config", file.path().to_str().unwrap()]))
            .unwrap();
    assert_eq!(config.workers, SimulationConfig::default().workers);
    assert_eq!(config.breakroom_dwell_ms, SimulationConfig::default().breakroom_dwell_ms);
}

/// Flag-style arguments parse without values.
#[test]
fn test_mode_flags() {
    let args = parse(&["--dry-run", "--verbose"]);
    assert!(args.dry_run);
    assert!(args.verbose);
    assert!(!args.debug);
    assert!(!args.print_config);
}

/// Values that cannot be zero fail validation after merging.
#[test]
fn test_merged_config_still_validates() {
    let config = SimulationConfig::from_cli_args(parse(&["--workers", "0"])).unwrap();
    assert!(config.validate().is_err());
}
