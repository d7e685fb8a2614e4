//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// logmux - fan log lines from stdin out to many destinations
#[derive(Parser, Debug)]
#[command(
    name = "logmux",
    author,
    version,
    about = "Fan stdin log lines out to network, socket and file destinations",
    long_about = "Reads lines from standard input and writes each one, with a per-destination \n\
                  prefix, to every configured destination (tcp, tls, udp, unix, unixgram, file).\n\n\
                  Unreachable destinations are retried lazily on the next line. Send SIGUSR2 \n\
                  to reload the configuration file without restarting."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "LOGMUX_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format (logs always go to stderr)
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "LOGMUX_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read stdin and fan lines out until end of input
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (JSON or TOML)
    #[arg(
        short,
        long,
        default_value = "./logmux.json",
        env = "LOGMUX_CONFIG"
    )]
    pub config: PathBuf,

    /// Dial and TLS handshake timeout in seconds
    #[arg(long, default_value = "5", env = "LOGMUX_DIAL_TIMEOUT")]
    pub dial_timeout: u64,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "LOGMUX_METRICS_PORT")]
    pub metrics_port: u16,

    /// Load configuration, print destinations and exit
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "./logmux.json", env = "LOGMUX_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
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
