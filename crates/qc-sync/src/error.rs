//! Sync-engine errors (§7: "Sync failure (invalid chain, I/O error):
//! discard the candidate, keep local chain").

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("transport error: {0}")]
    Transport(#[from] qc_transport::TransportError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("chain error: {0}")]
    Chain(#[from] qc_chain::ChainError),

    #[error("chunk was not valid base64")]
    BadChunk,

    #[error("downloaded chain failed full validation")]
    InvalidChain,
}
