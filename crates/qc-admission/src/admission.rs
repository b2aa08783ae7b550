//! Transaction admission and mining (§4.7).

use qc_chain::{Block, Chain, ChainHandle};
use qc_consensus::ConsensusRound;
use qc_transport::FrameClient;
use shared_types::Transaction;
use tracing::{info, warn};

use crate::error::AdmissionError;

/// Outcome of one `add_transaction` call.
#[derive(Debug, Clone)]
pub enum AdmissionOutcome {
    /// The transaction was appended, a block was mined, and the new block
    /// was broadcast to every known peer.
    Accepted { block: Block },
    /// A peer reported a strictly longer valid chain; the caller should
    /// sync before retrying (§4.7 step 1, §3 invariant).
    Rejected,
    /// The mined candidate did not reach quorum and was discarded without
    /// being committed or broadcast (used by [`add_transaction_with_consensus`]).
    NoQuorum,
}

/// Runs the §4.7 procedure: currency check, append, mine, broadcast.
///
/// Mining clones the current chain snapshot, mutates the clone, and swaps
/// it back into `handle` in one atomic replace — the chain itself has
/// exactly one writer at a time and admission is it (§5: "the chain itself
/// is single-writer").
pub async fn add_transaction(
    client: &FrameClient,
    peers: &[String],
    handle: &ChainHandle,
    miner_address: &str,
    tx: Transaction,
    now: i64,
) -> Result<AdmissionOutcome, AdmissionError> {
    let local_len = handle.load().len();
    if !qc_sync::is_chain_current(client, peers, local_len).await {
        info!(local_len, "admission rejected: a peer reports a longer chain");
        return Ok(AdmissionOutcome::Rejected);
    }

    let (chain, block) = mine_candidate(handle, miner_address, tx, now)?;
    handle.swap(chain);

    broadcast_new_block(client, peers, &block);
    Ok(AdmissionOutcome::Accepted { block })
}

/// Same currency-check/append/mine procedure as [`add_transaction`], but
/// the candidate is only committed and broadcast if it first clears a
/// Snowman quorum vote (§2: "on a local admission, drives the Snowman
/// Voter to collect quorum before persisting"). A candidate that fails
/// quorum is dropped without ever touching `handle`.
pub async fn add_transaction_with_consensus(
    client: &FrameClient,
    peers: &[String],
    handle: &ChainHandle,
    voter: &dyn ConsensusRound,
    miner_address: &str,
    tx: Transaction,
    now: i64,
) -> Result<AdmissionOutcome, AdmissionError> {
    let local_len = handle.load().len();
    if !qc_sync::is_chain_current(client, peers, local_len).await {
        info!(local_len, "admission rejected: a peer reports a longer chain");
        return Ok(AdmissionOutcome::Rejected);
    }

    let (chain, block) = mine_candidate(handle, miner_address, tx, now)?;

    let reached = voter
        .vote(&block, peers)
        .await
        .map_err(|e| warn!(error = %e, "vote encoding failed, treating as no quorum"))
        .unwrap_or(false);
    if !reached {
        warn!(index = block.index, "mined block failed to reach quorum, discarding");
        return Ok(AdmissionOutcome::NoQuorum);
    }

    handle.swap(chain);
    broadcast_new_block(client, peers, &block);
    Ok(AdmissionOutcome::Accepted { block })
}

/// Clones the current chain, appends `tx`, and mines it into a new block,
/// without committing the clone back into `handle`.
fn mine_candidate(
    handle: &ChainHandle,
    miner_address: &str,
    tx: Transaction,
    now: i64,
) -> Result<(Chain, Block), AdmissionError> {
    let mut chain = (*handle.load()).clone();
    chain.add_transaction(tx)?;
    let block = chain.mine_pending_transactions(miner_address, now);
    Ok((chain, block))
}

/// Fans `NewBlock:<json>` out to every peer as an independent task and
/// does not await any of them (§5: "the broadcast does not await").
fn broadcast_new_block(client: &FrameClient, peers: &[String], block: &Block) {
    let payload = match serde_json::to_string(block) {
        Ok(json) => format!("NewBlock:{json}"),
        Err(e) => {
            warn!(error = %e, "failed to serialize mined block, skipping broadcast");
            return;
        }
    };

    for peer in peers {
        let client = client.clone();
        let peer = peer.clone();
        let payload = payload.clone();
        tokio::spawn(async move {
            if let Err(e) = client.request(&peer, &payload).await {
                warn!(peer, error = %e, "NewBlock broadcast failed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qc_chain::Chain;
    use qc_transport::FrameServer;
    use shared_types::Transaction;
    use std::time::Duration;

    struct FixedVote(bool);

    #[async_trait::async_trait]
    impl ConsensusRound for FixedVote {
        async fn vote(
            &self,
            _block: &Block,
            _peers: &[String],
        ) -> Result<bool, qc_consensus::ConsensusError> {
            Ok(self.0)
        }
    }

    fn addr(tag: u8) -> String {
        format!("smartX{}", format!("{tag:02x}").repeat(20))
    }

    #[tokio::test]
    async fn accepts_when_no_peer_is_longer() {
        let server = FrameServer::bind("127.0.0.1:0", false).await.unwrap();
        let peer_addr = server.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok(conn) = server.accept().await else { break };
                let _ = conn.reply("1").await;
            }
        });

        let client = FrameClient::new(Duration::from_secs(2));
        let handle = ChainHandle::new(Chain::new());
        let tx = Transaction::new(addr(1), addr(2), rust_decimal::Decimal::ONE, vec![], "", 0);

        let outcome = add_transaction(
            &client,
            &[format!("tcp://{peer_addr}")],
            &handle,
            &addr(3),
            tx,
            100,
        )
        .await
        .unwrap();

        match outcome {
            AdmissionOutcome::Accepted { block } => {
                assert_eq!(block.index, 1);
                assert_eq!(handle.load().len(), 2);
            }
            other => panic!("expected acceptance, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejects_when_a_peer_reports_a_longer_chain() {
        let server = FrameServer::bind("127.0.0.1:0", false).await.unwrap();
        let peer_addr = server.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok(conn) = server.accept().await else { break };
                let _ = conn.reply("99").await;
            }
        });

        let client = FrameClient::new(Duration::from_secs(2));
        let handle = ChainHandle::new(Chain::new());
        let tx = Transaction::new(addr(1), addr(2), rust_decimal::Decimal::ONE, vec![], "", 0);

        let outcome = add_transaction(
            &client,
            &[format!("tcp://{peer_addr}")],
            &handle,
            &addr(3),
            tx,
            100,
        )
        .await
        .unwrap();

        assert!(matches!(outcome, AdmissionOutcome::Rejected));
        assert_eq!(handle.load().len(), 1, "rejected admission leaves the chain untouched");
    }

    #[tokio::test]
    async fn consensus_gated_admission_commits_only_on_quorum() {
        let client = FrameClient::new(Duration::from_secs(2));
        let handle = ChainHandle::new(Chain::new());
        let tx = Transaction::new(addr(1), addr(2), rust_decimal::Decimal::ONE, vec![], "", 0);

        let outcome = add_transaction_with_consensus(
            &client,
            &[],
            &handle,
            &FixedVote(false),
            &addr(3),
            tx,
            100,
        )
        .await
        .unwrap();

        assert!(matches!(outcome, AdmissionOutcome::NoQuorum));
        assert_eq!(handle.load().len(), 1, "a rejected quorum must not touch the chain");
    }

    #[tokio::test]
    async fn consensus_gated_admission_commits_when_quorum_reached() {
        let client = FrameClient::new(Duration::from_secs(2));
        let handle = ChainHandle::new(Chain::new());
        let tx = Transaction::new(addr(1), addr(2), rust_decimal::Decimal::ONE, vec![], "", 0);

        let outcome = add_transaction_with_consensus(
            &client,
            &[],
            &handle,
            &FixedVote(true),
            &addr(3),
            tx,
            100,
        )
        .await
        .unwrap();

        assert!(matches!(outcome, AdmissionOutcome::Accepted { .. }));
        assert_eq!(handle.load().len(), 2);
    }
}
