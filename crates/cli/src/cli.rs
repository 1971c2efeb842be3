//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use observability::ObservabilityConfig;

/// ES Distributor - event fan-out node driven by synthetic traffic
#[derive(Parser, Debug)]
#[command(
    name = "es-distributor",
    author,
    version,
    about = "Event distributor node: random dispatch, registration broadcast, sample passthrough",
    long_about = "Loads a distributor node configuration, reports its endpoints, and drives \n\
                  the node with synthetic events and handler registrations to inspect how \n\
                  traffic spreads across output ports."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "ES_DISTRIBUTOR_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "ES_DISTRIBUTOR_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Tracing settings derived from the global flags
    pub fn observability_config(&self) -> ObservabilityConfig {
        let (level, forced) = if self.quiet {
            ("warn", true)
        } else {
            match self.verbose {
                0 => ("info", false),
                1 => ("debug", false),
                _ => ("trace", false),
            }
        };

        ObservabilityConfig {
            log_format: self.log_format.into(),
            metrics_port: None,
            default_log_level: level.to_string(),
            force_log_level: forced,
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Drive a distributor node with synthetic traffic
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "distributor.toml",
        env = "ES_DISTRIBUTOR_CONFIG"
    )]
    pub config: PathBuf,

    /// Number of plain events sent to `dist_random`
    #[arg(long, default_value = "1000", env = "ES_DISTRIBUTOR_EVENTS")]
    pub events: u64,

    /// Number of handler registrations sent before the events
    #[arg(long, default_value = "1", env = "ES_DISTRIBUTOR_REGISTRATIONS")]
    pub registrations: u64,

    /// Items per sample block (0 = no sample traffic)
    #[arg(long, default_value = "0")]
    pub items: usize,

    /// Number of sample blocks interleaved with the events
    #[arg(long, default_value = "10")]
    pub blocks: u64,

    /// Override the random seed from configuration
    #[arg(long, env = "ES_DISTRIBUTOR_SEED")]
    pub seed: Option<u64>,

    /// Run timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "ES_DISTRIBUTOR_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Channel buffer size for the node input queue
    #[arg(long, default_value = "100", env = "ES_DISTRIBUTOR_BUFFER_SIZE")]
    pub buffer_size: usize,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "ES_DISTRIBUTOR_METRICS_PORT")]
    pub metrics_port: u16,

    /// Output the run report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "distributor.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "distributor.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_args() {
        let cli = Cli::try_parse_from([
            "es-distributor",
            "run",
            "-c",
            "node.toml",
            "--events",
            "100",
            "--registrations",
            "2",
            "--seed",
            "7",
        ])
        .unwrap();

        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.events, 100);
                assert_eq!(args.registrations, 2);
                assert_eq!(args.seed, Some(7));
                assert_eq!(args.items, 0);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_quiet_forces_warn_level() {
        let cli = Cli::try_parse_from(["es-distributor", "-q", "info"]).unwrap();
        let config = cli.observability_config();
        assert_eq!(config.default_log_level, "warn");
        assert!(config.force_log_level);
        assert_eq!(config.metrics_port, None);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["es-distributor", "-q", "-v", "info"]);
        assert!(result.is_err());
    }
}
