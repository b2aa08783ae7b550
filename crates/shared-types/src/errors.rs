//! # Error Types
//!
//! Error types shared across subsystems that don't warrant their own crate.

use thiserror::Error;

/// Errors produced while validating a [`crate::Transaction`] prior to
/// admission onto the pending set.
#[derive(Debug, Clone, Error)]
pub enum TransactionError {
    /// `sender` or `recipient` did not match the `smartX` address format.
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] crate::address::AddressError),

    /// `gas` did not match `10 + 2*(len(data)+len(info))`.
    #[error("gas mismatch: expected {expected}, found {found}")]
    GasMismatch { expected: u64, found: u64 },

    /// `signature` was not of the `base64(sig)|fingerprint` shape, or the
    /// two halves did not both verify.
    #[error("invalid signature")]
    InvalidSignature,
}
