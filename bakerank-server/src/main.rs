//! BakeRank server.
//!
//! Counts `!bake` rewards for stream viewers, keeps the score ledger on disk
//! and pushes every bake to the connected overlays over WebSocket.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use bakerank_core::engine::BakeEngine;
use bakerank_core::events::{BakeCommandReceiver, BakeHandle, bake_command_channel};
use bakerank_core::hub::BroadcastHub;
use bakerank_core::ledger::{Ledger, TextFileStore};
use bakerank_core::processors::BakeDispatcher;
use bakerank_core::ranks::RankTable;
use bakerank_core::rewards::{DirectoryAssets, RewardCatalog};
use clap::Parser;
use config::{ConfigLoader, LoadedConfig};
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Live-stream bake rewards and overlay broadcaster
#[derive(Parser, Debug)]
#[command(name = "bakerank-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// TOML configuration file; defaults apply when it does not exist
    #[arg(short, long, default_value = "./bakerank-config.toml")]
    config: PathBuf,

    /// Listen address, overriding `[server] listen`
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Emit logs as JSON lines
    #[arg(long, env = "BAKERANK_LOG_JSON")]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    tracing::info!("Starting bakerank-server v{}", env!("CARGO_PKG_VERSION"));

    let config = ConfigLoader::new(&args.config, args.listen)
        .load()
        .inspect_err(|e| tracing::error!("Failed to load configuration: {}", e))?;
    tracing::info!(
        ledger = %config.ledger_path.display(),
        overlay_dir = %config.overlay_dir.display(),
        "Configuration ready"
    );

    let (state, command_rx) = build_state(&config)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let dispatcher = tokio::spawn(
        BakeDispatcher::new(state.engine.clone(), state.hub.clone()).run(shutdown_rx, command_rx),
    );

    let result = server::run_server(server::build_router(state), config.listen).await;

    // HTTP is down; let the dispatcher drain out.
    let _ = shutdown_tx.send(true);
    if let Err(e) = dispatcher.await {
        tracing::error!("Bake dispatcher task failed: {}", e);
    }
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Open the ledger and reward folder and wire engine, hub and command queue.
fn build_state(config: &LoadedConfig) -> anyhow::Result<(AppState, BakeCommandReceiver)> {
    let ledger = Ledger::open(TextFileStore::new(&config.ledger_path));

    let catalog = RewardCatalog::new(DirectoryAssets::new(&config.overlay_dir));
    catalog
        .validate()
        .inspect_err(|e| tracing::error!("Reward catalog is unusable: {}", e))?;
    let snapshot = catalog.snapshot();
    tracing::info!(
        normal = snapshot.normal.len(),
        legendary = snapshot.legendary.len(),
        "Reward catalog ready"
    );

    let engine = Arc::new(
        BakeEngine::new(ledger, RankTable::default(), catalog).with_cooldown(config.cooldown),
    );
    let hub = Arc::new(BroadcastHub::new(
        config.send_timeout,
        config.subscriber_buffer,
    ));
    let (command_tx, command_rx) = bake_command_channel();

    Ok((
        AppState::new(engine, hub, BakeHandle::new(command_tx)),
        command_rx,
    ))
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bakerank_core=debug"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
