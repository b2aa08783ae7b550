//! Scenario 5 (§8): a peer with a shorter chain polls `GetBlockCount`,
//! discovers it is behind, downloads the longer chain in chunks over
//! `GetChain`, and ends up with a strictly longer, valid chain — driven
//! end to end through the real dispatcher handlers, not a fixed-reply
//! stub.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use qc_chain::{Chain, ChainHandle};
    use qc_dispatcher::{dispatch, DispatchReply, NodeContext};
    use qc_directory::Directory;
    use qc_sync::{sync_if_behind, SyncOutcome};
    use qc_transport::{FrameClient, FrameServer};

    fn miner(tag: u8) -> String {
        format!("smartX{}", format!("{tag:02x}").repeat(20))
    }

    /// Binds a real [`FrameServer`] and answers every connection through
    /// the same [`dispatch`] routing a live node uses, the way
    /// `qc_dispatcher::server::serve` does internally.
    async fn spawn_peer(ctx: NodeContext) -> String {
        let server = FrameServer::bind("127.0.0.1:0", ctx.debug).await.unwrap();
        let addr = server.local_addr().unwrap();
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
        format!("tcp://{addr}")
    }

    #[tokio::test]
    async fn a_shorter_peer_catches_up_to_a_longer_valid_peer() {
        let mut ahead = Chain::new();
        for i in 0..6u8 {
            ahead.mine_pending_transactions(&miner(i), i as i64);
        }
        let ahead_len = ahead.len();
        assert_eq!(ahead_len, 7, "genesis plus six mined blocks");

        let peer_ctx = NodeContext::new(
            Directory::new(b"chunked-sync-secret".to_vec()),
            ChainHandle::new(ahead),
            FrameClient::new(Duration::from_secs(2)),
            miner(9),
            false,
        );
        let peer_addr = spawn_peer(peer_ctx).await;

        let client = FrameClient::new(Duration::from_secs(2));
        let behind = ChainHandle::new(Chain::new());
        assert_eq!(behind.load().len(), 1, "a fresh chain is just the genesis block");

        let outcome = sync_if_behind(&client, &[peer_addr], &behind).await;

        assert_eq!(outcome, SyncOutcome::Replaced { new_len: ahead_len });
        assert_eq!(behind.load().len(), ahead_len);
        assert!(behind.load().is_valid());
    }

    #[tokio::test]
    async fn a_peer_already_at_the_front_does_not_sync() {
        let mut chain = Chain::new();
        chain.mine_pending_transactions(&miner(1), 1);
        let local_len = chain.len();

        let peer_ctx = NodeContext::new(
            Directory::new(b"chunked-sync-secret".to_vec()),
            ChainHandle::new(chain.clone()),
            FrameClient::new(Duration::from_secs(2)),
            miner(9),
            false,
        );
        let peer_addr = spawn_peer(peer_ctx).await;

        let client = FrameClient::new(Duration::from_secs(2));
        let handle = ChainHandle::new(chain);
        let outcome = sync_if_behind(&client, &[peer_addr], &handle).await;

        assert_eq!(outcome, SyncOutcome::Unchanged);
        assert_eq!(handle.load().len(), local_len);
    }
}
