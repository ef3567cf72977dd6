use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use blueprov::{build_application, GattServer, MemoryNetwork};

mod bridge;
mod config;

use bridge::Bridge;
use config::DaemonConfig;

/// BLE GATT provisioning peripheral
#[derive(Parser, Debug)]
#[command(name = "blueprovd", version, about)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter, overrides LOG_LEVEL (default: info)
    #[arg(long)]
    log_level: Option<String>,

    /// Mount the test service regardless of the configuration file
    #[arg(long)]
    test_service: bool,
}

fn init_tracing(level: Option<&str>) {
    let level = level
        .map(str::to_string)
        .or_else(|| std::env::var("LOG_LEVEL").ok())
        .unwrap_or_else(|| "info".into())
        .to_lowercase();
    // stdout carries the bridge protocol
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref());

    // ── Config ─────────────────────────────────────────────────────
    let mut config = DaemonConfig::load(args.config.as_deref())?;
    if args.test_service {
        config.server.test_service = true;
    }
    tracing::info!(
        poll_interval_ms = config.server.poll_interval_ms,
        dispatch = ?config.server.dispatch,
        test_service = config.server.test_service,
        "configuration loaded"
    );

    // ── Application ────────────────────────────────────────────────
    let network = Arc::new(MemoryNetwork::from_seed(config.network));
    let tree = build_application(network, &config.server).context("building GATT application")?;

    let (signals_tx, signals_rx) = mpsc::unbounded_channel();
    let (server, handle) = GattServer::new(tree, signals_tx);
    let shutdown = server.cancellation_token();
    let server_task = tokio::spawn(server.run());

    // ── Bridge ─────────────────────────────────────────────────────
    let mut bridge = Bridge::new(handle.clone(), tokio::io::stdout());
    bridge
        .register()
        .await
        .context("failed to register application")?;
    tracing::info!("GATT application registered");

    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted, shutting down");
            ctrl_c.cancel();
        }
    });

    let served = bridge
        .serve(BufReader::new(tokio::io::stdin()), signals_rx, shutdown.clone())
        .await;

    handle.shutdown();
    server_task.await.context("server task panicked")?;
    served
}
