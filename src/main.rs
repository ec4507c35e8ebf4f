//! Pixel Brawl headless host
//!
//! Runs one match in real time and writes every snapshot to stdout as a JSON
//! line. Logs go to stderr so the snapshot stream stays machine-readable.

use anyhow::Context;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pixel_brawl::app::{MatchRunner, RunnerOptions};
use pixel_brawl::config::{Config, LogFormat};
use pixel_brawl::game::{AiPolicy, Difficulty, MatchController, MatchMode};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env().context("loading configuration")?;

    // Initialize tracing
    init_tracing(&config.log_level, config.log_format);

    let seed = config.seed.unwrap_or_else(rand::random);
    let arena = config.arena()?;

    info!(
        seed,
        mode = ?config.mode,
        arena_width = arena.width,
        arena_height = arena.height,
        "Starting Pixel Brawl"
    );

    let cpu_difficulty = match config.mode {
        MatchMode::VsCpu(difficulty) => difficulty,
        MatchMode::Versus => Difficulty::default(),
    };
    let controller = MatchController::new(
        config.rules(),
        arena,
        AiPolicy::seeded(cpu_difficulty, seed),
    )
    .context("building match")?;

    let autopilot = config
        .autopilot
        .then(|| AiPolicy::seeded(config.autopilot_difficulty, seed.wrapping_add(1)));

    let options = RunnerOptions {
        sim_tps: config.sim_tps,
        snapshot_tps: config.snapshot_tps,
        max_ticks: config.max_ticks,
        arena,
    };
    let (mut runner, handle) = MatchRunner::new(controller, autopilot, options);
    runner.start(config.mode);

    // Snapshot printer; ends when the runner drops its sender
    let mut snapshots = handle.snapshot_tx.subscribe();
    drop(handle);
    let printer = tokio::spawn(async move {
        loop {
            match snapshots.recv().await {
                Ok(snapshot) => match serde_json::to_string(&snapshot) {
                    Ok(line) => println!("{line}"),
                    Err(e) => warn!(error = %e, "Failed to encode snapshot"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Snapshot printer lagging");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut match_task = tokio::spawn(runner.run());

    tokio::select! {
        result = &mut match_task => {
            let summary = result.context("match task panicked")?;
            info!(
                winner = ?summary.winner,
                p1_wins = summary.p1_wins,
                p2_wins = summary.p2_wins,
                ticks = summary.ticks,
                "Match complete"
            );
        }
        _ = shutdown_signal() => {
            match_task.abort();
        }
    }

    let _ = printer.await;

    info!("Shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str, format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
