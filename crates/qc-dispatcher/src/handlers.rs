//! Tag parsing and routing (§4.4, §4.9).

use base64::{engine::general_purpose::STANDARD, Engine as _};
use qc_chain::{Block, Chain};
use shared_types::Transaction;
use tracing::{info, warn};

use crate::compression;
use crate::context::{now_unix, NodeContext};

/// What a handler wants written back to the peer that sent the request.
pub enum DispatchReply {
    /// One frame.
    Single(String),
    /// Many frames, terminated by the transport's `END` sentinel —
    /// `GetChain`'s shape.
    Stream(Vec<String>),
    /// No frame at all; the connection simply closes (`NewBlock`'s
    /// success path, §4.4: "no reply on success path").
    None,
}

/// Parses `request` (already fingerprint-stripped) and runs the matching
/// handler, trying each tag prefix in the order tabulated at §4.4. An
/// unrecognized tag gets `"ERROR: Unknown message"` (§4.9).
pub async fn dispatch(ctx: &NodeContext, request: &str) -> DispatchReply {
    if let Some(rest) = request.strip_prefix("Register:") {
        return DispatchReply::Single(handle_register(ctx, rest));
    }
    if request == "GetNodes" {
        return DispatchReply::Single(handle_get_nodes(ctx));
    }
    if let Some(rest) = request.strip_prefix("Vote:") {
        return DispatchReply::Single(handle_vote(rest));
    }
    if let Some(rest) = request.strip_prefix("VerifyCode:") {
        return DispatchReply::Single(handle_verify_code(rest));
    }
    if let Some(rest) = request.strip_prefix("Heartbeat:") {
        return DispatchReply::Single(handle_heartbeat(ctx, rest));
    }
    if let Some(rest) = request.strip_prefix("GetBlockCount:") {
        return DispatchReply::Single(handle_get_block_count(ctx, rest));
    }
    if request == "GetChain" {
        return DispatchReply::Stream(handle_get_chain(ctx));
    }
    if let Some(rest) = request.strip_prefix("NewBlock:") {
        handle_new_block(ctx, rest);
        return DispatchReply::None;
    }
    if let Some(rest) = request.strip_prefix("AddTransaction:") {
        return DispatchReply::Single(handle_add_transaction(ctx, rest).await);
    }

    warn!(request, "unrecognized message tag");
    DispatchReply::Single("ERROR: Unknown message".to_string())
}

/// `Register:<addr>:<sig>` (first-time registration) or the bare
/// `Register:<addr>` shape this node's own fan-out sends to already-known
/// peers (§9: "the registration format is parsed by splitting on `:`
/// expecting 5 parts but the outbound broadcast sends only 2; receivers
/// must tolerate both shapes"). We resolve this by trying the
/// signature-bearing shape first (split on the *last* `:`, since `addr`
/// itself is a `tcp://host:port` URI full of colons but a signature never
/// contains one) and falling back to a signature-less refresh of an
/// already-known peer when that fails.
fn handle_register(ctx: &NodeContext, rest: &str) -> String {
    let now = now_unix();

    if let Some((addr, sig)) = rest.rsplit_once(':') {
        match ctx.directory.register(addr, sig, now) {
            Ok(is_new) => {
                if is_new {
                    fan_out_register(ctx, addr, now);
                }
                return "OK".to_string();
            }
            Err(e) => {
                info!(addr, error = %e, "signature-bearing registration failed, trying fallback shape");
            }
        }
    }

    if ctx.directory.heartbeat(rest, now) {
        "OK".to_string()
    } else {
        "ERROR: Invalid registration".to_string()
    }
}

/// Rebroadcasts a new registration to every other currently known peer,
/// fire-and-forget, using the signature-less 2-part shape (§4.5).
fn fan_out_register(ctx: &NodeContext, new_addr: &str, now: i64) {
    let payload = format!("Register:{new_addr}");
    for peer in ctx.directory.active_peers(now) {
        if peer == new_addr {
            continue;
        }
        let client = ctx.client.clone();
        let payload = payload.clone();
        tokio::spawn(async move {
            if let Err(e) = client.request(&peer, &payload).await {
                warn!(peer, error = %e, "registration fan-out failed");
            }
        });
    }
}

fn handle_get_nodes(ctx: &NodeContext) -> String {
    ctx.directory.active_peers(now_unix()).join(",")
}

/// `Vote:<base64-block>` — reply `"OK"` iff the block decodes and its
/// `calculate_hash()` matches its `hash` (§4.8).
fn handle_vote(payload: &str) -> String {
    if Block::verify_base64(payload) {
        "OK".to_string()
    } else {
        String::new()
    }
}

/// `VerifyCode:<base64-gz-code>` — decompress then run static analysis.
fn handle_verify_code(payload: &str) -> String {
    let Ok(compressed) = STANDARD.decode(payload) else {
        return String::new();
    };
    let Ok(source) = compression::decompress(&compressed) else {
        return String::new();
    };
    match qc_safety_analyzer::analyze(&source) {
        Ok(()) => "OK".to_string(),
        Err(_) => String::new(),
    }
}

fn handle_heartbeat(ctx: &NodeContext, addr: &str) -> String {
    if ctx.directory.heartbeat(addr, now_unix()) {
        "OK".to_string()
    } else {
        "ERROR: Invalid address".to_string()
    }
}

/// `GetBlockCount:<peer-count>` — the sender's own count is informational
/// only; we always reply with our local length (§4.4).
fn handle_get_block_count(ctx: &NodeContext, _peer_count: &str) -> String {
    ctx.chain.load().len().to_string()
}

fn handle_get_chain(ctx: &NodeContext) -> Vec<String> {
    let chain = ctx.chain.load();
    match qc_sync::serve_chain_chunks(&*chain) {
        Ok(chunks) => chunks,
        Err(e) => {
            warn!(error = %e, "failed to serve chain for GetChain");
            Vec::new()
        }
    }
}

/// `NewBlock:<json>` — append to the local chain if it links to our tip;
/// never replies, on either path (§4.4, §7).
fn handle_new_block(ctx: &NodeContext, json: &str) {
    let block: Block = match serde_json::from_str(json) {
        Ok(block) => block,
        Err(e) => {
            warn!(error = %e, "NewBlock payload was not valid JSON");
            return;
        }
    };

    let mut chain: Chain = (*ctx.chain.load()).clone();
    if chain.add_block(block) {
        ctx.chain.swap(chain);
    }
}

/// `AddTransaction:<json>` — runs the full admission pipeline gated by a
/// Snowman quorum vote (§2, §4.7, §4.8).
async fn handle_add_transaction(ctx: &NodeContext, json: &str) -> String {
    let tx: Transaction = match serde_json::from_str(json) {
        Ok(tx) => tx,
        Err(e) => return format!("ERROR: {e}"),
    };

    let peers = ctx.known_peers();
    let outcome = qc_admission::add_transaction_with_consensus(
        &ctx.client,
        &peers,
        &ctx.chain,
        &ctx.voter,
        &ctx.miner_address,
        tx,
        now_unix(),
    )
    .await;

    match outcome {
        Ok(qc_admission::AdmissionOutcome::Accepted { block }) => {
            info!(index = block.index, "transaction admitted and mined");
            "OK".to_string()
        }
        Ok(qc_admission::AdmissionOutcome::Rejected) => {
            "ERROR: local chain is behind a known peer".to_string()
        }
        Ok(qc_admission::AdmissionOutcome::NoQuorum) => {
            "ERROR: mined block did not reach quorum".to_string()
        }
        Err(e) => format!("ERROR: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qc_chain::ChainHandle;
    use qc_directory::Directory;
    use qc_transport::FrameClient;
    use std::time::Duration;

    fn ctx() -> NodeContext {
        NodeContext::new(
            Directory::new(b"chain-secret".to_vec()),
            ChainHandle::new(Chain::new()),
            FrameClient::new(Duration::from_secs(1)),
            "smartX0000000000000000000000000000000000000009",
            false,
        )
    }

    #[tokio::test]
    async fn unknown_tag_is_rejected() {
        let ctx = ctx();
        match dispatch(&ctx, "NotARealTag").await {
            DispatchReply::Single(s) => assert_eq!(s, "ERROR: Unknown message"),
            _ => panic!("expected a single reply"),
        }
    }

    #[tokio::test]
    async fn get_block_count_reports_local_length() {
        let ctx = ctx();
        match dispatch(&ctx, "GetBlockCount:0").await {
            DispatchReply::Single(s) => assert_eq!(s, "1"),
            _ => panic!("expected a single reply"),
        }
    }

    #[tokio::test]
    async fn get_nodes_lists_active_peers() {
        let ctx = ctx();
        let addr = "tcp://127.0.0.1:9100";
        let sig = shared_types::hmac_sig::sign_hmac(b"chain-secret", addr);
        ctx.directory.register(addr, &sig, now_unix()).unwrap();

        match dispatch(&ctx, "GetNodes").await {
            DispatchReply::Single(s) => assert_eq!(s, addr),
            _ => panic!("expected a single reply"),
        }
    }

    #[tokio::test]
    async fn register_with_valid_signature_succeeds() {
        let ctx = ctx();
        let addr = "tcp://127.0.0.1:9101";
        let sig = shared_types::hmac_sig::sign_hmac(b"chain-secret", addr);
        match dispatch(&ctx, &format!("Register:{addr}:{sig}")).await {
            DispatchReply::Single(s) => assert_eq!(s, "OK"),
            _ => panic!("expected a single reply"),
        }
        assert_eq!(ctx.directory.active_peers(now_unix()), vec![addr.to_string()]);
    }

    #[tokio::test]
    async fn register_tolerates_the_signature_less_broadcast_shape_for_known_peers() {
        let ctx = ctx();
        let addr = "tcp://127.0.0.1:9102";
        let sig = shared_types::hmac_sig::sign_hmac(b"chain-secret", addr);
        ctx.directory.register(addr, &sig, 0).unwrap();

        match dispatch(&ctx, &format!("Register:{addr}")).await {
            DispatchReply::Single(s) => assert_eq!(s, "OK"),
            _ => panic!("expected a single reply"),
        }
    }

    #[tokio::test]
    async fn vote_accepts_a_self_consistent_block() {
        let block = Block::new(1, 1, Vec::new(), Block::genesis().hash);
        let payload = format!("Vote:{}", block.to_base64().unwrap());
        match dispatch(&ctx(), &payload).await {
            DispatchReply::Single(s) => assert_eq!(s, "OK"),
            _ => panic!("expected a single reply"),
        }
    }

    #[tokio::test]
    async fn vote_rejects_a_tampered_block() {
        match dispatch(&ctx(), "Vote:not-valid-base64!!").await {
            DispatchReply::Single(s) => assert_eq!(s, ""),
            _ => panic!("expected a single reply"),
        }
    }

    #[tokio::test]
    async fn verify_code_accepts_benign_compressed_source() {
        let compressed = compression::compress("class C { void Run() {} }").unwrap();
        let payload = format!("VerifyCode:{}", STANDARD.encode(compressed));
        match dispatch(&ctx(), &payload).await {
            DispatchReply::Single(s) => assert_eq!(s, "OK"),
            _ => panic!("expected a single reply"),
        }
    }

    #[tokio::test]
    async fn verify_code_rejects_forbidden_source() {
        let compressed = compression::compress("System.IO.File.ReadAllText(\"x\");").unwrap();
        let payload = format!("VerifyCode:{}", STANDARD.encode(compressed));
        match dispatch(&ctx(), &payload).await {
            DispatchReply::Single(s) => assert_eq!(s, ""),
            _ => panic!("expected a single reply"),
        }
    }

    #[tokio::test]
    async fn get_chain_streams_the_local_chain_as_chunks() {
        match dispatch(&ctx(), "GetChain").await {
            DispatchReply::Stream(chunks) => assert!(!chunks.is_empty()),
            _ => panic!("expected a stream reply"),
        }
    }

    #[tokio::test]
    async fn new_block_appends_a_valid_successor_with_no_reply() {
        let ctx = ctx();
        let tip = ctx.chain.load().latest_block().hash.clone();
        let block = Block::new(1, 1, Vec::new(), tip);
        let json = serde_json::to_string(&block).unwrap();

        match dispatch(&ctx, &format!("NewBlock:{json}")).await {
            DispatchReply::None => {}
            _ => panic!("expected no reply"),
        }
        assert_eq!(ctx.chain.load().len(), 2);
    }
}
