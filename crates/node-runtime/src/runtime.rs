//! Wires the Peer Node Subsystem together and runs it until cancelled
//! (§5: "three long-running tasks ... main request/reply loop, peer
//! synchronization loop [5 s], per-peer heartbeat loops [20 s]").

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use qc_chain::{Chain, ChainHandle};
use qc_directory::Directory;
use qc_dispatcher::{serve, NodeContext};
use qc_transport::{FrameClient, REQUEST_TIMEOUT};
use shared_types::hmac_sig::sign_hmac;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::NodeConfig;

const SYNC_TICK: Duration = Duration::from_secs(5);
const HEARTBEAT_TICK: Duration = Duration::from_secs(20);
const DIRECTORY_GOSSIP_TICK: Duration = Duration::from_secs(qc_directory::GOSSIP_INTERVAL_SECS);
const CHAIN_FILE_NAME: &str = "chain.dat";

/// Builds the node's shared context, loading a persisted chain from
/// `config.data_dir` if one exists, and runs every long-running task until
/// `shutdown` is cancelled.
pub async fn run(config: NodeConfig, shutdown: CancellationToken) -> anyhow::Result<()> {
    let chain_path = Path::new(&config.data_dir).join(CHAIN_FILE_NAME);
    let chain = load_or_init_chain(&chain_path);
    let chain_len = chain.len();

    let ctx = Arc::new(NodeContext::new(
        Directory::new(config.chain_secret.clone().into_bytes()),
        ChainHandle::new(chain),
        FrameClient::new(REQUEST_TIMEOUT),
        config.miner_address.clone(),
        config.debug,
    ));
    info!(chain_len, port = config.port, "node context ready");

    bootstrap_peers(&ctx, &config).await;

    let addr = format!("0.0.0.0:{}", config.port);
    let dispatcher = tokio::spawn(run_dispatcher(addr, Arc::clone(&ctx), shutdown.clone()));
    let sync_loop = tokio::spawn(run_sync_loop(Arc::clone(&ctx), shutdown.clone()));
    let heartbeat_loop = tokio::spawn(run_heartbeat_loop(
        Arc::clone(&ctx),
        config.own_addr(),
        shutdown.clone(),
    ));
    let directory_gossip_loop = tokio::spawn(run_directory_gossip_loop(
        Arc::clone(&ctx),
        config.peers.clone(),
        shutdown.clone(),
    ));

    shutdown.cancelled().await;
    info!("shutdown signal received, waiting for background tasks to stop");

    let _ = tokio::join!(dispatcher, sync_loop, heartbeat_loop, directory_gossip_loop);

    if let Err(e) = ctx.chain.load().save(&chain_path) {
        warn!(error = %e, path = %chain_path.display(), "failed to persist chain on shutdown");
    }

    Ok(())
}

fn load_or_init_chain(path: &Path) -> Chain {
    if path.exists() {
        match Chain::load(path) {
            Ok(chain) if chain.is_valid() => {
                info!(path = %path.display(), len = chain.len(), "loaded persisted chain");
                return chain;
            }
            Ok(_) => warn!(path = %path.display(), "persisted chain failed validation, starting fresh"),
            Err(e) => warn!(path = %path.display(), error = %e, "failed to load persisted chain, starting fresh"),
        }
    }
    Chain::new()
}

/// Registers this node with every configured seed peer (§4.5). Failures
/// are logged, not fatal — a seed that is temporarily unreachable is
/// simply absent from the directory until the heartbeat loop or an
/// inbound registration fills it in later.
async fn bootstrap_peers(ctx: &NodeContext, config: &NodeConfig) {
    let own_addr = config.own_addr();
    let sig = sign_hmac(config.chain_secret.as_bytes(), &own_addr);
    let payload = format!("Register:{own_addr}:{sig}");

    for peer in &config.peers {
        match ctx.client.request(peer, &payload).await {
            Ok(reply) if reply.trim() == "OK" => {
                info!(peer, "registered with seed peer");
            }
            Ok(reply) => warn!(peer, reply, "seed peer rejected registration"),
            Err(e) => warn!(peer, error = %e, "failed to reach seed peer at startup"),
        }
    }
}

/// Runs the accept/rebind server loop until `shutdown` fires. `serve`
/// itself only returns on a fatal bind failure (§4.9); a cancellation
/// during normal operation simply drops the in-flight accept future.
async fn run_dispatcher(addr: String, ctx: Arc<NodeContext>, shutdown: CancellationToken) {
    tokio::select! {
        result = serve(&addr, ctx) => {
            if let Err(e) = result {
                warn!(error = %e, "dispatcher server loop exited");
            }
        }
        () = shutdown.cancelled() => {
            info!("dispatcher loop cancelled");
        }
    }
}

async fn run_sync_loop(ctx: Arc<NodeContext>, shutdown: CancellationToken) {
    let mut ticker = interval(SYNC_TICK);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let peers = ctx.known_peers();
                if peers.is_empty() {
                    continue;
                }
                let outcome = qc_sync::sync_if_behind(&ctx.client, &peers, &ctx.chain).await;
                if let qc_sync::SyncOutcome::Replaced { new_len } = outcome {
                    info!(new_len, "chain synchronized from a peer");
                }
            }
            () = shutdown.cancelled() => {
                info!("sync loop cancelled");
                break;
            }
        }
    }
}

/// Every tick, fires an independent `Heartbeat:` task per currently known
/// peer without awaiting any of them (§5: "each outbound peer broadcast is
/// dispatched as an independent task; the broadcast does not await").
async fn run_heartbeat_loop(ctx: Arc<NodeContext>, own_addr: String, shutdown: CancellationToken) {
    let payload = format!("Heartbeat:{own_addr}");

    let mut ticker = interval(HEARTBEAT_TICK);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for peer in ctx.known_peers() {
                    let client = ctx.client.clone();
                    let payload = payload.clone();
                    tokio::spawn(async move {
                        if let Err(e) = client.request(&peer, &payload).await {
                            warn!(peer, error = %e, "heartbeat failed");
                        }
                    });
                }
            }
            () = shutdown.cancelled() => {
                info!("heartbeat loop cancelled");
                break;
            }
        }
    }
}

/// Every [`DIRECTORY_GOSSIP_TICK`], asks each statically configured peer
/// `GetNodes` and merges the comma-joined addresses it returns into this
/// node's directory, never overwriting a more recent timestamp (§4.5:
/// "every 5 s, query each static peer with `GetNodes` and merge returned
/// addresses into the directory"). A merged address is stamped with the
/// time of the merge itself — the reply carries no timestamps of its own,
/// only the set of addresses the peer currently considers active.
async fn run_directory_gossip_loop(
    ctx: Arc<NodeContext>,
    static_peers: Vec<String>,
    shutdown: CancellationToken,
) {
    if static_peers.is_empty() {
        return;
    }

    let mut ticker = interval(DIRECTORY_GOSSIP_TICK);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for peer in &static_peers {
                    match ctx.client.request(peer, "GetNodes").await {
                        Ok(reply) => {
                            let now = qc_dispatcher::now_unix();
                            let merged: std::collections::HashMap<String, i64> = reply
                                .split(',')
                                .map(str::trim)
                                .filter(|addr| !addr.is_empty())
                                .map(|addr| (addr.to_string(), now))
                                .collect();
                            if !merged.is_empty() {
                                ctx.directory.merge(&merged);
                            }
                        }
                        Err(e) => warn!(peer, error = %e, "directory gossip query failed"),
                    }
                }
            }
            () = shutdown.cancelled() => {
                info!("directory gossip loop cancelled");
                break;
            }
        }
    }
}
