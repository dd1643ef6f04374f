//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// Datapipe - sync labor-statistics and population data, then analyze it
///
/// Without a trigger, both datasets are synced into the object store.
/// A trigger carrying queued records runs the analysis instead.
///
/// Examples:
///   datapipe
///   datapipe --analyze --format markdown
///   datapipe --event event.json --output envelope.json
///   datapipe --store-root /var/lib/datapipe --notify-url http://localhost:9000/hook
///   datapipe --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Trigger event JSON file (`-` reads stdin)
    ///
    /// An event with a nonempty `Records` array runs the analysis;
    /// any other event runs the sync.
    #[arg(short, long, value_name = "FILE", conflicts_with = "analyze")]
    pub event: Option<PathBuf>,

    /// Run the analysis as if a queued message had arrived
    #[arg(short, long)]
    pub analyze: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .datapipe.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Root directory of the object store
    #[arg(long, value_name = "DIR", env = "DATAPIPE_STORE_ROOT")]
    pub store_root: Option<PathBuf>,

    /// Time-series origin URL
    #[arg(long, value_name = "URL", env = "DATAPIPE_TIME_SERIES_URL")]
    pub time_series_url: Option<String>,

    /// Population origin URL
    #[arg(long, value_name = "URL", env = "DATAPIPE_POPULATION_URL")]
    pub population_url: Option<String>,

    /// Webhook receiving population update notifications
    ///
    /// When unset, notifications are written to the log.
    #[arg(long, value_name = "URL", env = "DATAPIPE_NOTIFY_URL")]
    pub notify_url: Option<String>,

    /// HTTP request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Output format (json, markdown)
    #[arg(long, default_value = "json", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Write the output to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .datapipe.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the invocation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Response envelope as JSON (default)
    #[default]
    Json,
    /// Human-readable Markdown
    Markdown,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref event) = self.event {
            if event.as_os_str() != "-" && !event.is_file() {
                return Err(format!("Event file does not exist: {}", event.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
