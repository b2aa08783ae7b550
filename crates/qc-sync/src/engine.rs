//! The Sync Engine itself (§4.6).

use std::io::Write;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use qc_chain::{Chain, ChainHandle};
use qc_transport::FrameClient;
use tracing::{info, warn};

use crate::error::SyncError;

/// Tag the dispatcher recognizes for a block-count query (§4.4).
fn get_block_count_message(local_len: usize) -> String {
    format!("GetBlockCount:{local_len}")
}

/// Tag requesting the chunked chain stream (§4.4, §4.6).
const GET_CHAIN: &str = "GetChain";

/// What a sync attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No peer reported a longer chain, or the download/validation failed;
    /// the local chain is unchanged either way.
    Unchanged,
    /// The local chain was atomically replaced with a longer, valid one.
    Replaced { new_len: usize },
}

/// Polls every peer in `peers` with `GetBlockCount:<local_len>` and returns
/// `true` iff none of them reported a strictly larger count (§3 invariant:
/// "A transaction is admitted only if the local chain is not known to be
/// shorter than any queried peer's valid chain").
///
/// A peer that does not answer is treated as silent, not as evidence the
/// local chain is behind (§7: "never abort the local operation unless no
/// peers reply at all").
pub async fn is_chain_current(client: &FrameClient, peers: &[String], local_len: usize) -> bool {
    for peer in peers {
        if let Some(remote_len) = query_block_count(client, peer, local_len).await {
            if remote_len > local_len {
                return false;
            }
        }
    }
    true
}

async fn query_block_count(client: &FrameClient, peer: &str, local_len: usize) -> Option<usize> {
    match client.request(peer, &get_block_count_message(local_len)).await {
        Ok(reply) => match reply.trim().parse::<usize>() {
            Ok(count) => Some(count),
            Err(_) => {
                warn!(peer, reply, "non-numeric GetBlockCount reply");
                None
            }
        },
        Err(e) => {
            warn!(peer, error = %e, "GetBlockCount request failed");
            None
        }
    }
}

/// Runs the full §4.6 procedure: find the peer reporting the largest chain
/// longer than ours, download it in chunks, validate it, and swap it in on
/// success. Every failure along the way is logged and treated as "abandon
/// this sync round" — the local chain is never left partially updated.
pub async fn sync_if_behind(
    client: &FrameClient,
    peers: &[String],
    handle: &ChainHandle,
) -> SyncOutcome {
    let local_len = handle.load().len();

    let mut best: Option<(&str, usize)> = None;
    for peer in peers {
        if let Some(remote_len) = query_block_count(client, peer, local_len).await {
            if remote_len > local_len && best.is_none_or(|(_, n)| remote_len > n) {
                best = Some((peer.as_str(), remote_len));
            }
        }
    }

    let Some((peer, remote_len)) = best else {
        return SyncOutcome::Unchanged;
    };

    match download_and_validate(client, peer).await {
        Ok(candidate) if candidate.len() > local_len => {
            let new_len = candidate.len();
            handle.swap(candidate);
            info!(peer, remote_len, new_len, "chain replaced via sync");
            SyncOutcome::Replaced { new_len }
        }
        Ok(candidate) => {
            warn!(
                peer,
                downloaded_len = candidate.len(),
                local_len,
                "downloaded chain was not actually longer, discarding"
            );
            SyncOutcome::Unchanged
        }
        Err(e) => {
            warn!(peer, error = %e, "sync download/validation failed, keeping local chain");
            SyncOutcome::Unchanged
        }
    }
}

/// Serializes `chain` and splits it into base64 chunks of at most
/// [`qc_transport::SYNC_CHUNK_BYTES`] raw bytes each, ready to hand to
/// [`qc_transport::FrameConnection::reply_stream`] for a `GetChain` answer
/// (§4.4, §4.6 — the server side of the same exchange [`download_and_validate`]
/// consumes).
pub fn serve_chain_chunks(chain: &Chain) -> Result<Vec<String>, SyncError> {
    let tmp = tempfile::NamedTempFile::new()?;
    chain.save(tmp.path())?;
    let bytes = std::fs::read(tmp.path())?;
    Ok(bytes
        .chunks(qc_transport::SYNC_CHUNK_BYTES)
        .map(|chunk| STANDARD.encode(chunk))
        .collect())
}

/// Requests `GetChain` from `peer`, assembles the base64 chunk stream into
/// a temporary file (§4.6 steps 2-3), loads it as a [`Chain`], and checks
/// `is_valid()`. The temporary file is always removed on return, success or
/// failure, because it is a [`tempfile::NamedTempFile`] dropped at the end
/// of this function's scope (§4.6 step 5: "Always delete the temporary
/// file").
async fn download_and_validate(client: &FrameClient, peer: &str) -> Result<Chain, SyncError> {
    let chunks = client.request_stream(peer, GET_CHAIN).await?;

    let tmp = tempfile::NamedTempFile::new()?;
    {
        let mut file = tmp.reopen()?;
        for chunk in chunks {
            let bytes = STANDARD
                .decode(chunk.as_bytes())
                .map_err(|_| SyncError::BadChunk)?;
            file.write_all(&bytes)?;
        }
        file.flush()?;
    }

    let chain = Chain::load(tmp.path())?;
    if !chain.is_valid() {
        return Err(SyncError::InvalidChain);
    }
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qc_transport::FrameServer;
    use std::time::Duration;

    async fn spawn_fixed_reply_server(reply: &'static str) -> String {
        let server = FrameServer::bind("127.0.0.1:0", false).await.unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok(conn) = server.accept().await else { break };
                let _ = conn.reply(reply).await;
            }
        });
        format!("tcp://{addr}")
    }

    #[tokio::test]
    async fn is_chain_current_true_when_no_peer_is_longer() {
        let peer = spawn_fixed_reply_server("3").await;
        let client = FrameClient::new(Duration::from_secs(2));
        assert!(is_chain_current(&client, &[peer], 3).await);
    }

    #[tokio::test]
    async fn is_chain_current_false_when_a_peer_is_longer() {
        let peer = spawn_fixed_reply_server("7").await;
        let client = FrameClient::new(Duration::from_secs(2));
        assert!(!is_chain_current(&client, &[peer], 3).await);
    }

    #[tokio::test]
    async fn is_chain_current_ignores_unreachable_peers() {
        let client = FrameClient::new(Duration::from_millis(100));
        let unreachable = "tcp://127.0.0.1:1".to_string();
        assert!(is_chain_current(&client, &[unreachable], 3).await);
    }

    #[tokio::test]
    async fn sync_if_behind_replaces_chain_from_a_longer_valid_peer() {
        let server = FrameServer::bind("127.0.0.1:0", false).await.unwrap();
        let addr = server.local_addr().unwrap();

        let mut remote = Chain::new();
        for i in 0..6u8 {
            remote.mine_pending_transactions(
                &format!("smartX{}", format!("{i:02x}").repeat(20)),
                i as i64,
            );
        }
        let remote_len = remote.len();
        let tmp = tempfile::NamedTempFile::new().unwrap();
        remote.save(tmp.path()).unwrap();
        let bytes = std::fs::read(tmp.path()).unwrap();
        let chunk = STANDARD.encode(&bytes);

        tokio::spawn(async move {
            loop {
                let Ok(conn) = server.accept().await else { break };
                match conn.request() {
                    "GetChain" => {
                        let _ = conn.reply_stream(vec![chunk.clone()]).await;
                    }
                    req if req.starts_with("GetBlockCount:") => {
                        let _ = conn.reply(&remote_len.to_string()).await;
                    }
                    _ => {
                        let _ = conn.reply("ERROR: Unknown message").await;
                    }
                }
            }
        });

        let client = FrameClient::new(Duration::from_secs(2));
        let handle = ChainHandle::new(Chain::new());
        let outcome = sync_if_behind(&client, &[format!("tcp://{addr}")], &handle).await;
        assert_eq!(outcome, SyncOutcome::Replaced { new_len: remote_len });
        assert_eq!(handle.load().len(), remote_len);
    }

    #[test]
    fn serve_chain_chunks_round_trips_through_base64() {
        let mut chain = Chain::new();
        chain.mine_pending_transactions("smartX0000000000000000000000000000000000000001", 1);
        let chunks = serve_chain_chunks(&chain).unwrap();
        assert!(!chunks.is_empty());

        let mut bytes = Vec::new();
        for chunk in &chunks {
            bytes.extend(STANDARD.decode(chunk).unwrap());
        }
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), &bytes).unwrap();
        let reloaded = Chain::load(tmp.path()).unwrap();
        assert_eq!(reloaded.len(), chain.len());
        assert!(reloaded.is_valid());
    }

    #[tokio::test]
    async fn sync_if_behind_discards_an_invalid_chain() {
        let server = FrameServer::bind("127.0.0.1:0", false).await.unwrap();
        let addr = server.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok(conn) = server.accept().await else { break };
                match conn.request() {
                    "GetChain" => {
                        // Garbage bytes never decode as a valid chain.
                        let garbage = STANDARD.encode(b"not a chain");
                        let _ = conn.reply_stream(vec![garbage]).await;
                    }
                    req if req.starts_with("GetBlockCount:") => {
                        let _ = conn.reply("99").await;
                    }
                    _ => {}
                }
            }
        });

        let client = FrameClient::new(Duration::from_secs(2));
        let handle = ChainHandle::new(Chain::new());
        let outcome = sync_if_behind(&client, &[format!("tcp://{addr}")], &handle).await;
        assert_eq!(outcome, SyncOutcome::Unchanged);
        assert_eq!(handle.load().len(), 1);
    }
}
