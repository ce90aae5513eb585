//! CLI arguments and subcommands for watch-process.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::platform::Platform;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Default, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, Default, ValueEnum)]
pub enum ConfigFormat {
    #[default]
    Yaml,
    Json,
    Toml,
}

/// Platform override for CLI parsing
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PlatformArg {
    Linux,
    Mac,
    Windows,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Linux => Platform::Linux,
            PlatformArg::Mac => Platform::Mac,
            PlatformArg::Windows => Platform::Windows,
        }
    }
}

/// Main CLI arguments structure
#[derive(Parser, Debug, Default)]
#[command(
    name = "watch-process",
    about = "Samples the process table on an interval and emits one JSON record per process",
    long_about = "Samples the process table on an interval and emits one JSON record per process.\n\n\
                  Runs `ps` (Linux/macOS) or `Get-Process` (Windows), parses every output line \
                  into a flat record with a derived elapsed time, optionally filters by user and \
                  writes the records as JSON lines to stdout.",
    version = "0.1.0",
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Tag attached to every record (supports ${hostname} and __HOSTNAME__)
    #[arg(short = 't', long)]
    pub tag: Option<String>,

    /// Listing command to run instead of the built-in ps/Get-Process command
    #[arg(long)]
    pub ps_command: Option<String>,

    /// Field names for the listing columns (comma-separated)
    #[arg(long)]
    pub keys: Option<String>,

    /// Sampling interval, e.g. "5s" or "1m"
    #[arg(short = 'i', long)]
    pub interval: Option<String>,

    /// Upper bound for a single tick, e.g. "10s" (defaults to the interval)
    #[arg(long)]
    pub timeout: Option<String>,

    /// Emit only processes owned by these users (comma-separated)
    #[arg(long)]
    pub lookup_user: Option<String>,

    /// Command printing the host name for tag placeholders
    #[arg(long)]
    pub hostname_command: Option<String>,

    /// Field type declarations, e.g. "pid:integer,cpu_percent:float"
    #[arg(long)]
    pub types: Option<String>,

    /// Force the listing layout instead of detecting it
    #[arg(long, value_enum)]
    pub platform: Option<PlatformArg>,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration and that the listing command runs
    Check {
        /// Also run one sampling tick and report how many records it produced
        #[arg(long)]
        sample: bool,
    },

    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },

    /// Run a few sampling ticks and print the records
    Test {
        /// Number of ticks to run
        #[arg(short = 'n', long, default_value_t = 1)]
        iterations: usize,

        /// Print every record instead of the first few per tick
        #[arg(long)]
        verbose: bool,
    },
}
