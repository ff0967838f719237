//! PulsePoint CLI - find nearby facilities and navigate to them
//!
//! Facilities come from the PulsePoint backend, or from a JSON file with
//! `--facilities` for offline use. The observer position defaults to the
//! configured location and can be overridden with `--at LAT,LNG`.

use clap::{Parser, Subcommand, ValueEnum};
use owo_colors::OwoColorize;
use pulsepoint_core::error::exit_codes;
use pulsepoint_geo::Coordinate;
use pulsepoint_telemetry::TelemetryConfig;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod context;
mod facilities;
mod output;

use commands::{config, find, navigate, nearby, route};
use context::Context;

/// Facility proximity search and navigation
#[derive(Parser)]
#[command(name = "pulsepoint")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (searched in standard locations if not given)
    #[arg(short, long, global = true, env = "PULSEPOINT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Read facilities from a JSON file instead of the backend
    #[arg(long, global = true, value_name = "FILE")]
    facilities: Option<PathBuf>,

    /// Observer position as LAT,LNG (defaults to the configured location)
    #[arg(long, global = true, value_name = "LAT,LNG", value_parser = parse_coordinate, allow_hyphen_values = true)]
    at: Option<Coordinate>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List facilities sorted by distance
    Nearby {
        /// Search radius in kilometers (defaults to the configured radius)
        #[arg(short, long)]
        radius: Option<f64>,

        /// Show at most this many facilities
        #[arg(short, long)]
        limit: Option<usize>,

        /// Let the backend do the radius search (ignores --facilities)
        #[arg(long)]
        server: bool,
    },

    /// Find the nearest facility whose name contains QUERY
    Find {
        /// Case-insensitive part of the facility name
        query: String,
    },

    /// Fetch a route to the nearest facility matching QUERY
    Route {
        /// Case-insensitive part of the facility name
        query: String,

        /// Skip the routing service and use a straight line
        #[arg(long)]
        offline: bool,
    },

    /// Simulate a trip to the nearest facility matching QUERY
    Navigate {
        /// Case-insensitive part of the facility name
        query: String,

        /// Simulated travel speed in km/h
        #[arg(long, default_value_t = 30.0)]
        speed: f64,

        /// Milliseconds between simulated fixes (defaults to the configured interval)
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Skip the routing service and use a straight line
        #[arg(long)]
        offline: bool,

        /// Give up after this many seconds
        #[arg(long, default_value_t = 600)]
        timeout_secs: u64,
    },

    /// Show or create configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Print which file the configuration was loaded from
    Path,

    /// Write a configuration file with default values
    Init {
        /// Where to write the file
        #[arg(default_value = ".pulsepoint.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn parse_coordinate(value: &str) -> Result<Coordinate, String> {
    let (lat, lng) = value
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LNG but got '{value}'"))?;

    let lat: f64 = lat.trim().parse().map_err(|e| format!("bad latitude '{lat}': {e}"))?;
    let lng: f64 = lng.trim().parse().map_err(|e| format!("bad longitude '{lng}': {e}"))?;

    Coordinate::validated(lat, lng).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let telemetry = if cli.verbose {
        TelemetryConfig::verbose()
    } else {
        TelemetryConfig::default()
    };
    if let Err(e) = pulsepoint_telemetry::init_with_config(TelemetryConfig {
        json: cli.log_json,
        ..telemetry
    }) {
        eprintln!("{} {e}", "Warning:".yellow().bold());
    }

    let result = run(cli).await;

    tracing::debug!(metrics = %pulsepoint_telemetry::metrics().export_json(), "Run finished");

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", "Error:".red().bold());

            let code = e
                .downcast_ref::<pulsepoint_core::Error>()
                .map_or(exit_codes::FAILURE, pulsepoint_core::Error::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // `config init` must work even when the current config is broken
    if let Commands::Config {
        action: Some(ConfigAction::Init { path, force }),
    } = &cli.command
    {
        return config::init(path, *force);
    }

    let ctx = Context::load(cli.config.as_deref(), cli.format, cli.facilities, cli.at)?;

    match cli.command {
        Commands::Nearby {
            radius,
            limit,
            server,
        } => nearby::run(&ctx, radius, limit, server).await,

        Commands::Find { query } => find::run(&ctx, &query).await,

        Commands::Route { query, offline } => route::run(&ctx, &query, offline).await,

        Commands::Navigate {
            query,
            speed,
            interval_ms,
            offline,
            timeout_secs,
        } => {
            let options = navigate::Options {
                speed_kmh: speed,
                interval_ms,
                offline,
                timeout_secs,
            };
            navigate::run(&ctx, &query, options).await
        }

        Commands::Config { action } => match action.unwrap_or(ConfigAction::Show) {
            ConfigAction::Show => config::show(&ctx),
            ConfigAction::Path => config::path(&ctx),
            ConfigAction::Init { path, force } => config::init(&path, force),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinate() {
        let coordinate = parse_coordinate("9.9252, 78.1198").unwrap();
        assert_eq!(coordinate, Coordinate::new(9.9252, 78.1198));

        assert_eq!(
            parse_coordinate("-33.86,151.21").unwrap(),
            Coordinate::new(-33.86, 151.21)
        );
    }

    #[test]
    fn test_parse_coordinate_rejects_garbage() {
        assert!(parse_coordinate("9.9252").is_err());
        assert!(parse_coordinate("north,78").is_err());
        assert!(parse_coordinate("91,78").is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
