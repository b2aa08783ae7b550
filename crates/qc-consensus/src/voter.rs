//! Single-round quorum voting over a candidate block (§4.8).
//!
//! Real Snowman samples repeatedly until confidence is reached; this round
//! only ever asks once and decides from that one fan-out. [`ConsensusRound`]
//! exists so a future multi-round sampler can stand in without touching
//! callers (§9: "preserve the single-round behavior but gate behind an
//! interface allowing a future multi-round replacement").

use async_trait::async_trait;
use qc_chain::Block;
use qc_transport::FrameClient;
use tracing::{debug, warn};

use crate::error::ConsensusError;

/// `"OK"` is the only affirmative reply a vote recognizes (§4.8).
const VOTE_OK: &str = "OK";

/// A procedure that decides whether a candidate block reaches consensus
/// over a set of peers. [`SnowmanVoter`] is the only implementation today.
#[async_trait]
pub trait ConsensusRound: Send + Sync {
    async fn vote(&self, block: &Block, peers: &[String]) -> Result<bool, ConsensusError>;
}

/// Votes a candidate block past `⌊n/2⌋+1` of the peers known at round
/// start, all in parallel, with no retry and no memory across rounds
/// (§4.8: "The voter is stateless across rounds").
#[derive(Debug, Clone, Default)]
pub struct SnowmanVoter {
    client: FrameClient,
}

impl SnowmanVoter {
    #[must_use]
    pub fn new(client: FrameClient) -> Self {
        Self { client }
    }

    /// Quorum size for `n` peers: `⌊n/2⌋+1`.
    #[must_use]
    pub fn threshold(n: usize) -> usize {
        n / 2 + 1
    }
}

#[async_trait]
impl ConsensusRound for SnowmanVoter {
    /// Sends `Vote:<base64(block)>` to every peer, in parallel, and joins
    /// the whole fan-out before deciding (§5: "Votes within one Snowman
    /// round are joined by awaiting the whole fan-out"). A peer that
    /// times out, errors, or answers anything but exactly `"OK"` counts
    /// as a negative vote — ties and missing replies are never affirmative.
    async fn vote(&self, block: &Block, peers: &[String]) -> Result<bool, ConsensusError> {
        let payload = format!("Vote:{}", block.to_base64()?);
        let threshold = Self::threshold(peers.len());

        let mut ballots = tokio::task::JoinSet::new();
        for peer in peers {
            let client = self.client.clone();
            let payload = payload.clone();
            let peer = peer.clone();
            ballots.spawn(async move {
                match client.request(&peer, &payload).await {
                    Ok(reply) if reply.trim() == VOTE_OK => true,
                    Ok(reply) => {
                        debug!(peer, reply, "vote rejected by peer");
                        false
                    }
                    Err(e) => {
                        warn!(peer, error = %e, "vote request failed, counted negative");
                        false
                    }
                }
            });
        }

        let mut affirmative = 0;
        while let Some(result) = ballots.join_next().await {
            if result.unwrap_or(false) {
                affirmative += 1;
            }
        }
        debug!(affirmative, threshold, n = peers.len(), "snowman round complete");
        Ok(affirmative >= threshold)
    }
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

    fn sample_block() -> Block {
        Block::new(1, 1, Vec::new(), Block::genesis().hash)
    }

    #[test]
    fn threshold_is_floor_n_over_2_plus_1() {
        assert_eq!(SnowmanVoter::threshold(4), 3);
        assert_eq!(SnowmanVoter::threshold(5), 3);
        assert_eq!(SnowmanVoter::threshold(1), 1);
        assert_eq!(SnowmanVoter::threshold(0), 1);
    }

    #[tokio::test]
    async fn quorum_reached_with_three_of_four_ok() {
        let ok_a = spawn_fixed_reply_server(VOTE_OK).await;
        let ok_b = spawn_fixed_reply_server(VOTE_OK).await;
        let ok_c = spawn_fixed_reply_server(VOTE_OK).await;
        let empty = spawn_fixed_reply_server("").await;

        let voter = SnowmanVoter::new(FrameClient::new(Duration::from_secs(2)));
        let peers = vec![ok_a, ok_b, ok_c, empty];
        let result = voter.vote(&sample_block(), &peers).await.unwrap();
        assert!(result, "3 OK out of 4 should reach the 3-vote threshold");
    }

    #[tokio::test]
    async fn quorum_not_reached_with_two_of_four_ok() {
        let ok_a = spawn_fixed_reply_server(VOTE_OK).await;
        let ok_b = spawn_fixed_reply_server(VOTE_OK).await;
        let empty_a = spawn_fixed_reply_server("").await;
        let empty_b = spawn_fixed_reply_server("").await;

        let voter = SnowmanVoter::new(FrameClient::new(Duration::from_secs(2)));
        let peers = vec![ok_a, ok_b, empty_a, empty_b];
        let result = voter.vote(&sample_block(), &peers).await.unwrap();
        assert!(!result, "2 OK out of 4 should fall short of the 3-vote threshold");
    }

    #[tokio::test]
    async fn unreachable_peers_count_as_negative_not_as_errors() {
        let voter = SnowmanVoter::new(FrameClient::new(Duration::from_millis(100)));
        let peers = vec!["tcp://127.0.0.1:1".to_string()];
        let result = voter.vote(&sample_block(), &peers).await.unwrap();
        assert!(!result);
    }

    #[tokio::test]
    async fn quorum_monotonicity_more_ok_never_flips_true_to_false() {
        let client = FrameClient::new(Duration::from_secs(2));
        let voter = SnowmanVoter::new(client);
        let block = sample_block();

        let two_ok = vec![
            spawn_fixed_reply_server(VOTE_OK).await,
            spawn_fixed_reply_server(VOTE_OK).await,
            spawn_fixed_reply_server("").await,
            spawn_fixed_reply_server("").await,
        ];
        let three_ok = vec![
            spawn_fixed_reply_server(VOTE_OK).await,
            spawn_fixed_reply_server(VOTE_OK).await,
            spawn_fixed_reply_server(VOTE_OK).await,
            spawn_fixed_reply_server("").await,
        ];

        let weaker = voter.vote(&block, &two_ok).await.unwrap();
        let stronger = voter.vote(&block, &three_ok).await.unwrap();
        assert!(!weaker);
        assert!(stronger);
    }
}
