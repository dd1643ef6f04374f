//! Datapipe - labor-statistics and population data pipeline
//!
//! A CLI entry point that either syncs the two origin datasets into the
//! object store or, when triggered by queued messages, analyzes the
//! stored copies.
//!
//! Exit codes:
//!   0 - The invocation succeeded (status 200)
//!   1 - The invocation failed (status 500) or the tool could not start

mod analysis;
mod cli;
mod config;
mod context;
mod dispatcher;
mod error;
mod models;
mod notify;
mod origin;
mod report;
mod store;
mod sync;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use context::PipelineContext;
use dispatcher::{Outcome, Trigger};
use error::PipelineResult;
use std::io::Read;
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("Datapipe v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .datapipe.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "{} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("Created {} with default settings.", DEFAULT_CONFIG_FILE);
    Ok(())
}

/// Initialize logging based on verbosity settings. `RUST_LOG` wins when set.
fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::default().add_directive(LevelFilter::from_level(args.log_level()).into())
    });

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: a tracing subscriber was already installed");
    }
}

/// Run one invocation. Returns whether it succeeded.
async fn run(args: Args) -> Result<bool> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate().context("Invalid configuration")?;

    let ctx = PipelineContext::from_config(&config)?;

    let outcome = match read_trigger(&args)? {
        Ok(trigger) => dispatcher::dispatch(&ctx, &trigger).await,
        Err(e) => {
            error!("Error decoding trigger: {}", e);
            Outcome::Failed(e)
        }
    };

    let envelope = outcome.envelope();
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&envelope)?,
        OutputFormat::Markdown => report::generate_markdown_report(&outcome, Utc::now()),
    };

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            info!("Output written to {}", path.display());
        }
        None => println!("{}", output),
    }

    Ok(envelope.status_code == 200)
}

/// Build the trigger from --event / --analyze.
///
/// An unreadable event source is an error; an undecodable event is a failed
/// invocation and still produces an envelope.
fn read_trigger(args: &Args) -> Result<PipelineResult<Trigger>> {
    if args.analyze {
        return Ok(Ok(Trigger::analysis()));
    }

    let Some(ref path) = args.event else {
        return Ok(Ok(Trigger::default()));
    };

    let content = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read event from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read event file: {}", path.display()))?
    };

    Ok(Trigger::from_json(&content))
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
