//! Pulsewatch (v1)
//!
//! Periodically probes HTTP endpoints and alerts on confirmed health changes.
//!
//! # Architecture Overview
//!
//! ```text
//!   pulsewatch.toml ──▶ config ──▶ startup ──▶ Watcher
//!                                               │
//!                 ┌─────────────────────────────┼─────────────────────────────┐
//!                 ▼                             ▼                             ▼
//!          probe loop (url A)            probe loop (url B)            signal listener
//!           │ GET ─▶ state machine        │ GET ─▶ state machine        SIGINT/SIGTERM
//!           ▼                             ▼                                  │
//!        Dispatcher ──▶ notifiers (on ERROR edges)                           ▼
//!                   └─▶ sinks (every attempt)                         Shutdown::trigger
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use pulsewatch::config::load_config;
use pulsewatch::lifecycle::startup::build_watcher;
use pulsewatch::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "pulsewatch", version)]
#[command(about = "Monitor HTTP endpoints and alert on confirmed outages and recoveries", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "pulsewatch.toml")]
    config: PathBuf,

    /// Validate the configuration and exit without probing.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("pulsewatch: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&cli.config)?;

    if cli.check {
        println!(
            "{}: OK ({} monitors, {} notifiers, {} sinks)",
            cli.config.display(),
            config.monitors.len(),
            config.notifiers.len(),
            config.sinks.len()
        );
        return Ok(());
    }

    logging::init_logging(&config.observability)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "pulsewatch starting"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let watcher = build_watcher(&config).await?;
    watcher.start()?;

    watcher.wait_for_shutdown().await;
    watcher.stop().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
