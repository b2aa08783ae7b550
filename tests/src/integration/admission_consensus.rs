//! Scenario 6 (§8) combined with §4.7's mining procedure: a mined
//! candidate block is only committed once it clears a Snowman quorum
//! vote answered by real dispatcher peers, not a mock [`ConsensusRound`].

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use qc_chain::{Chain, ChainHandle};
    use qc_consensus::SnowmanVoter;
    use qc_dispatcher::{dispatch, DispatchReply, NodeContext};
    use qc_directory::Directory;
    use qc_transport::{FrameClient, FrameServer};
    use shared_types::Transaction;

    fn addr(tag: u8) -> String {
        format!("smartX{}", format!("{tag:02x}").repeat(20))
    }

    /// Answers every connection through the real dispatcher routing,
    /// exactly as `qc_dispatcher::server::serve` does internally, so its
    /// `Vote:` reply comes from [`qc_chain::Block::verify_base64`] rather
    /// than a canned response.
    async fn spawn_peer() -> String {
        let ctx = NodeContext::new(
            Directory::new(b"admission-consensus-secret".to_vec()),
            ChainHandle::new(Chain::new()),
            FrameClient::new(Duration::from_secs(2)),
            addr(9),
            false,
        );
        let server = FrameServer::bind("127.0.0.1:0", false).await.unwrap();
        let local = server.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok(conn) = server.accept().await else { break };
                let request = conn.request().to_string();
                match dispatch(&ctx, &request).await {
                    DispatchReply::Single(reply) => {
                        let _ = conn.reply(&reply).await;
                    }
                    DispatchReply::Stream(chunks) => {
                        let _ = conn.reply_stream(chunks).await;
                    }
                    DispatchReply::None => {}
                }
            }
        });
        format!("tcp://{local}")
    }

    #[tokio::test]
    async fn a_candidate_block_is_committed_once_real_peers_reach_quorum() {
        let client = FrameClient::new(Duration::from_secs(2));
        let voter = SnowmanVoter::new(client.clone());
        let handle = ChainHandle::new(Chain::new());
        let tx = Transaction::new(addr(1), addr(2), rust_decimal::Decimal::ONE, vec![], "", 0);

        let mut peers = Vec::new();
        for _ in 0..3 {
            peers.push(spawn_peer().await);
        }

        let outcome = qc_admission::add_transaction_with_consensus(
            &client, &peers, &handle, &voter, &addr(3), tx, 100,
        )
        .await
        .unwrap();

        match outcome {
            qc_admission::AdmissionOutcome::Accepted { block } => {
                assert_eq!(block.index, 1);
                assert_eq!(handle.load().len(), 2);
                assert!(handle.load().is_valid());
            }
            other => panic!("expected acceptance once quorum was reached, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn no_peers_means_no_quorum_and_the_chain_is_left_untouched() {
        let client = FrameClient::new(Duration::from_secs(2));
        let voter = SnowmanVoter::new(client.clone());
        let handle = ChainHandle::new(Chain::new());
        let tx = Transaction::new(addr(1), addr(2), rust_decimal::Decimal::ONE, vec![], "", 0);

        let outcome = qc_admission::add_transaction_with_consensus(
            &client, &[], &handle, &voter, &addr(3), tx, 100,
        )
        .await
        .unwrap();

        assert!(matches!(outcome, qc_admission::AdmissionOutcome::NoQuorum));
        assert_eq!(handle.load().len(), 1);
    }
}
