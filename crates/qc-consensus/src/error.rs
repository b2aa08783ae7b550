//! Snowman voter errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("candidate block failed to encode for the vote payload: {0}")]
    Encode(#[from] qc_chain::BlockCodecError),
}
