//! # Permissioned Chain Node — entry point
//!
//! Loads configuration, brings up telemetry, and runs the dispatcher, sync,
//! and heartbeat loops until `Ctrl+C` (§5, §6).

use clap::Parser;
use node_runtime::config::NodeConfig;
use node_runtime::runtime;
use quantum_telemetry::TelemetryConfig;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Command-line flags for the node binary.
#[derive(Debug, Parser)]
#[command(name = "node-runtime", about = "Permissioned chain node")]
struct Cli {
    /// Path to the node's TOML configuration file.
    #[arg(long, default_value = "./node.toml")]
    config: String,

    /// Force-skip the fingerprint check on inbound frames, overriding
    /// whatever the config file says.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let telemetry_config = TelemetryConfig::for_subsystem("node", "runtime");
    let _telemetry = quantum_telemetry::init_telemetry(telemetry_config).await?;

    let mut config = NodeConfig::load(&cli.config)?;
    if cli.debug {
        config.debug = true;
    }
    std::fs::create_dir_all(&config.data_dir)?;

    info!(port = config.port, peers = config.peers.len(), "starting node");

    let shutdown = CancellationToken::new();
    let ctrl_c_token = shutdown.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("Ctrl+C received, shutting down");
        ctrl_c_token.cancel();
    });

    runtime::run(config, shutdown).await
}
