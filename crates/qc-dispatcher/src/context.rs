//! Shared state the dispatcher's handlers read and mutate (§5: "the Node
//! Directory is accessed from the dispatcher, the sync loop, and the
//! heartbeat handler").

use std::time::{SystemTime, UNIX_EPOCH};

use qc_chain::ChainHandle;
use qc_consensus::SnowmanVoter;
use qc_directory::Directory;
use qc_transport::FrameClient;

/// Everything a single running node needs to answer peer messages and
/// drive its own admission/sync/voting activity.
pub struct NodeContext {
    pub directory: Directory,
    pub chain: ChainHandle,
    pub client: FrameClient,
    pub voter: SnowmanVoter,
    /// Address this node credits with the mining reward (§4.7).
    pub miner_address: String,
    /// Skips the fingerprint check on inbound frames (§4.4, §6).
    pub debug: bool,
}

impl NodeContext {
    #[must_use]
    pub fn new(
        directory: Directory,
        chain: ChainHandle,
        client: FrameClient,
        miner_address: impl Into<String>,
        debug: bool,
    ) -> Self {
        Self {
            voter: SnowmanVoter::new(client.clone()),
            directory,
            chain,
            client,
            miner_address: miner_address.into(),
            debug,
        }
    }

    /// The peers this node currently considers live, used uniformly for
    /// sync polling, vote fan-out, and block/registration broadcast.
    #[must_use]
    pub fn known_peers(&self) -> Vec<String> {
        self.directory.active_peers(now_unix())
    }
}

/// Current Unix timestamp in seconds.
#[must_use]
pub fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is after 1970")
        .as_secs() as i64
}
