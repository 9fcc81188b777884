//! EngulfingTrader - Main Entry Point
//!
//! Loads configuration, starts one trading session and runs the scheduler
//! until Ctrl-C.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use engulfing_trader::config::{load_config, load_from_env};
use engulfing_trader::{
    EntitlementCheck, HttpEntitlementChecker, InMemoryEntitlements, LogNotifier, Scheduler,
    SchedulerConfig, SessionHandle, WebSocketConnector,
};

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "TRADER_LOG_LEVEL")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    if args.json_logs {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    info!("Starting EngulfingTrader");
    info!("Configuration file: {}", args.config);

    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let config = if Path::new(&args.config).exists() {
        load_config(Some(&args.config))
    } else {
        info!("No configuration file, reading flat TRADER_* variables");
        load_from_env()
    }
    .context("loading configuration")?;
    let settings = config
        .session
        .clone()
        .context("no [session] section configured")?;

    let timeout = Duration::from_secs(config.venue.request_timeout_seconds);
    let entitlements: Arc<dyn EntitlementCheck> = match &config.entitlements.url {
        Some(url) => Arc::new(HttpEntitlementChecker::new(url, timeout)?),
        None => {
            let allowed = config
                .entitlements
                .allowed
                .iter()
                .cloned()
                .chain(std::iter::once(settings.owner.clone()));
            Arc::new(InMemoryEntitlements::with_allowed(allowed))
        }
    };

    let connector = WebSocketConnector::new(&config.venue)?;
    info!(url = %connector.url(), "Venue endpoint");

    let session = SessionHandle::new();
    session
        .configure(settings.owner.clone(), settings.to_session_config()?)
        .await?;

    let scheduler = Scheduler::new(
        connector,
        session.clone(),
        entitlements,
        Arc::new(LogNotifier),
        SchedulerConfig::from_app(&config),
    );
    let task = scheduler.spawn();

    info!("{}", session.snapshot().await.status_line());

    // Keep the application running
    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal, cleaning up...");

    task.shutdown().await;
    Ok(())
}
