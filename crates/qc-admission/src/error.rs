//! Admission pipeline errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("transaction rejected by the chain: {0}")]
    Chain(#[from] qc_chain::ChainError),
}
