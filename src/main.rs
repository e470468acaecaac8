//! Vigil - Adaptive Health Monitoring & Self-Healing
//!
//! Periodic control loop with an HTTP API for status and on-demand checks.
//!
//! # Usage
//!
//! ```bash
//! # Run with the simulated metrics provider and built-in config
//! cargo run --release
//!
//! # Faster cycles for a demo
//! cargo run --release -- --interval 5
//!
//! # Custom config and bind address
//! cargo run --release -- --config ./vigil.toml --addr 0.0.0.0:9090
//! ```
//!
//! # Environment Variables
//!
//! - `VIGIL_CONFIG`: Path to a TOML config file
//! - `VIGIL_CORS_ORIGINS`: Comma-separated allowed CORS origins
//! - `RUST_LOG`: Logging level (default: info)
//! - `RESET_DB`: Set to "true" to wipe persistent data on startup (for testing)

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use vigil::api::{create_app, ApiState};
use vigil::config::{self, MonitorConfig};
use vigil::healing::{context::shared_context, simulated_handlers, ActionExecutor, TriggerEngine};
use vigil::monitor::{HealthEvaluator, SimulatedProvider};
use vigil::pipeline::{AppState, MonitorLoop};
use vigil::storage::EventLog;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "vigil")]
#[command(about = "Adaptive health monitoring and self-healing control loop")]
#[command(version)]
struct CliArgs {
    /// Override the server address (default: "0.0.0.0:8080")
    #[arg(short, long)]
    addr: Option<String>,

    /// Path to a TOML config file (overrides VIGIL_CONFIG)
    #[arg(long)]
    config: Option<String>,

    /// Override the check interval in seconds
    #[arg(long)]
    interval: Option<u64>,

    /// Probability per cycle that a simulated component starts degrading
    #[arg(long, default_value = "0.05")]
    degrade_chance: f64,

    /// Reset all persistent data on startup.
    /// Can also be set via RESET_DB=true environment variable.
    #[arg(long)]
    reset_db: bool,
}

// ============================================================================
// Database Reset
// ============================================================================

/// Check if database reset is requested via CLI flag or environment variable.
fn should_reset_db(cli_flag: bool) -> bool {
    if cli_flag {
        return true;
    }
    if let Ok(val) = std::env::var("RESET_DB") {
        let val_lower = val.to_lowercase();
        return val_lower == "true" || val_lower == "1" || val_lower == "yes";
    }
    false
}

/// Safely remove the data directory and all its contents.
fn reset_data_directory(data_dir: &str) -> Result<()> {
    let data_path = std::path::Path::new(data_dir);

    if !data_path.exists() {
        info!("Data directory does not exist, nothing to reset");
        return Ok(());
    }

    warn!("RESET_DB detected, wiping {}", data_path.display());
    std::fs::remove_dir_all(data_path).context("Failed to remove data directory")?;
    warn!("Data directory removed; a fresh event log will be created on startup");

    Ok(())
}

// ============================================================================
// Task Names for Supervisor Logging
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum TaskName {
    HttpServer,
    MonitorLoop,
}

impl std::fmt::Display for TaskName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskName::HttpServer => write!(f, "HttpServer"),
            TaskName::MonitorLoop => write!(f, "MonitorLoop"),
        }
    }
}

// ============================================================================
// Supervisor
// ============================================================================

/// Run the supervisor loop: monitor tasks, cancel on failure.
async fn run_supervisor(
    task_set: &mut JoinSet<Result<TaskName>>,
    cancel_token: CancellationToken,
) -> Result<()> {
    info!("Supervisor: all tasks spawned, monitoring...");

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                info!("Supervisor: shutdown signal received");
                break;
            }
            result = task_set.join_next() => {
                match result {
                    Some(Ok(Ok(task_name))) => {
                        info!("Supervisor: task {} completed normally", task_name);
                    }
                    Some(Ok(Err(e))) => {
                        error!("Supervisor: task failed with error: {}", e);
                        cancel_token.cancel();
                        return Err(e);
                    }
                    Some(Err(e)) => {
                        error!("Supervisor: task panicked: {}", e);
                        cancel_token.cancel();
                        return Err(anyhow::anyhow!("Task panicked: {}", e));
                    }
                    None => {
                        info!("Supervisor: all tasks completed");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();

    // Configuration: explicit --config path wins over the standard search.
    let mut cfg = match &args.config {
        Some(path) => MonitorConfig::load_from_file(std::path::Path::new(path))
            .with_context(|| format!("Failed to load config from {path}"))?,
        None => MonitorConfig::load(),
    };
    if let Some(interval) = args.interval {
        cfg.monitor.check_interval_secs = interval.max(1);
    }
    if let Some(addr) = &args.addr {
        cfg.server.addr = addr.clone();
    }
    cfg.validate().context("Invalid configuration")?;

    if should_reset_db(args.reset_db) {
        reset_data_directory(&cfg.storage.data_dir)?;
    }

    config::init(cfg);
    let cfg = config::get();

    info!(
        instance = %cfg.service.instance,
        components = cfg.components().len(),
        triggers = cfg.triggers.len(),
        interval_secs = cfg.monitor.check_interval_secs,
        "Vigil starting"
    );

    // Event log: failures degrade to in-memory operation rather than abort.
    let log_path = std::path::Path::new(&cfg.storage.data_dir).join("events.db");
    let event_log = match EventLog::open(&log_path) {
        Ok(log) => {
            match log.prune_older_than(cfg.storage.retention_days) {
                Ok(0) => {}
                Ok(n) => info!("Pruned {} event records older than {} days", n, cfg.storage.retention_days),
                Err(e) => warn!("Failed to prune old event records: {}", e),
            }
            Some(log)
        }
        Err(e) => {
            warn!("Failed to open event log: {}. History will not be persisted.", e);
            None
        }
    };

    // Wiring: provider, evaluator, healing context, executor, loop.
    let provider = Arc::new(SimulatedProvider::new(args.degrade_chance));
    let app_state = Arc::new(RwLock::new(AppState::default()));
    let ctx = shared_context();

    let evaluator = Arc::new(HealthEvaluator::new(
        cfg.thresholds.clone(),
        provider.clone(),
        event_log.clone(),
    ));

    let mut executor = ActionExecutor::new(
        ctx.clone(),
        event_log.clone(),
        Duration::from_secs(cfg.healing.handler_timeout_secs),
    );
    for handler in simulated_handlers(0.1) {
        executor.register(handler);
    }
    let executor = Arc::new(executor);

    let cancel_token = CancellationToken::new();
    let mut task_set: JoinSet<Result<TaskName>> = JoinSet::new();

    // Task: monitor loop
    let monitor_loop = MonitorLoop::new(
        cfg.components(),
        cfg.triggers.clone(),
        provider,
        evaluator.clone(),
        TriggerEngine::new(ctx),
        executor,
        app_state.clone(),
        event_log.clone(),
        Duration::from_secs(cfg.monitor.check_interval_secs),
        cfg.monitor.cycle_warn_ms,
        cfg.scoring.auto_commit,
        cancel_token.clone(),
    );
    task_set.spawn(async move {
        info!("[MonitorLoop] Task starting");
        monitor_loop.run().await;
        Ok(TaskName::MonitorLoop)
    });

    // Task: HTTP server
    let api_state = ApiState {
        app_state,
        evaluator,
        components: cfg.components(),
        log: event_log,
    };
    let app = create_app(api_state);
    let listener = tokio::net::TcpListener::bind(&cfg.server.addr)
        .await
        .with_context(|| format!("Failed to bind to {}", cfg.server.addr))?;
    info!("HTTP server listening on {}", cfg.server.addr);

    let server_cancel = cancel_token.clone();
    task_set.spawn(async move {
        info!("[HttpServer] Task starting");
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                server_cancel.cancelled().await;
                info!("[HttpServer] Received shutdown signal");
            })
            .await;

        match result {
            Ok(()) => Ok(TaskName::HttpServer),
            Err(e) => {
                error!("[HttpServer] Server error: {}", e);
                Err(anyhow::anyhow!("HTTP server error: {}", e))
            }
        }
    });

    // Ctrl-C triggers graceful shutdown.
    let ctrlc_cancel = cancel_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, shutting down");
            ctrlc_cancel.cancel();
        }
    });

    let result = run_supervisor(&mut task_set, cancel_token).await;

    task_set.shutdown().await;
    info!("Vigil stopped");
    result
}
