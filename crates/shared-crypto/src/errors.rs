//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Signature verification failed.
    #[error("signature verification failed")]
    SignatureVerificationFailed,

    /// Invalid signature format (not a valid compact ECDSA signature).
    #[error("invalid signature format")]
    InvalidSignatureFormat,

    /// Invalid public key (not a valid compressed secp256k1 point).
    #[error("invalid public key")]
    InvalidPublicKey,

    /// Invalid private key (not a valid secp256k1 scalar).
    #[error("invalid private key")]
    InvalidPrivateKey,
}
