//! Chain-subsystem errors.

use thiserror::Error;

/// Errors raised while mutating or persisting a [`crate::Chain`].
#[derive(Debug, Error)]
pub enum ChainError {
    /// A block failed the linkage/hash check and was rejected by
    /// [`crate::Chain::add_block`].
    #[error("block {index} rejected: {reason}")]
    InvalidBlock { index: u64, reason: String },

    /// A transaction failed [`shared_types::Transaction::validate_shape`].
    #[error("transaction rejected: {0}")]
    InvalidTransaction(#[from] shared_types::TransactionError),

    /// `save`/`load` failed at the filesystem or encoding boundary.
    #[error("chain persistence error: {0}")]
    Io(#[from] std::io::Error),

    /// The on-disk bytes did not decode as a chain.
    #[error("chain decode error: {0}")]
    Decode(#[from] bincode::Error),
}
