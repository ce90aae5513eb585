//! watch-process - version 0.1.0
//!
//! Process table sampler with tracing logging.
//! This is the main entry point that resolves configuration, handles
//! subcommands and runs the sampling loop until shutdown.

use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Level};

use watch_process::cli::{Args, Commands, LogLevel};
use watch_process::commands::{command_check, command_config, command_test};
use watch_process::config::{resolve_config, show_config, validate_effective_config, Config};
use watch_process::{JsonLinesSink, Sampler, SamplerSettings};

/// Initializes tracing logging subsystem with configured log level.
///
/// Logs go to stderr; stdout carries the records.
fn setup_logging(args: &Args) {
    let log_level = match args.log_level {
        LogLevel::Off => None,
        LogLevel::Error => Some(Level::ERROR),
        LogLevel::Warn => Some(Level::WARN),
        LogLevel::Info => Some(Level::INFO),
        LogLevel::Debug => Some(Level::DEBUG),
        LogLevel::Trace => Some(Level::TRACE),
    };
    let Some(log_level) = log_level else {
        return;
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return;
    }

    info!("Logging initialized with level: {:?}", args.log_level);
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> anyhow::Result<Config> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Completes when SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

/// Main application entry point.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, &args.config_format);
    }

    setup_logging(&args);

    // Handle subcommands
    if let Some(command) = &args.command {
        return match command {
            Commands::Config {
                output,
                format,
                commented,
            } => command_config(output.clone(), format.clone(), *commented),
            Commands::Check { sample } => {
                let config = resolve_config(&args)?;
                command_check(*sample, &config).await
            }
            Commands::Test {
                iterations,
                verbose,
            } => {
                let config = load_validated_config(&args)?;
                command_test(*iterations, *verbose, &config).await
            }
        };
    }

    let config = load_validated_config(&args)?;

    info!("Starting watch-process");

    // Configuration errors (e.g. a failing hostname command) are fatal here,
    // before the first tick.
    let settings = match SamplerSettings::from_config(&config).await {
        Ok(settings) => settings,
        Err(e) => {
            error!("❌ Configuration invalid: {}", e);
            eprintln!("❌ Configuration invalid: {}", e);
            std::process::exit(1);
        }
    };

    let sampler = Sampler::new(settings, Arc::new(JsonLinesSink::stdout()));
    let stats = sampler.stats();

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_cancel.cancel();
    });

    sampler.run(cancel).await;

    let summary = stats.summary();
    info!(
        "watch-process stopped gracefully: {} ticks ({} failed), {} records emitted, {} lines skipped, {} dropped",
        summary.ticks_total,
        summary.tick_failures,
        summary.records_emitted,
        summary.lines_skipped,
        summary.records_dropped
    );
    Ok(())
}
