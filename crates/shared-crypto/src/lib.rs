//! # Shared Crypto — Block Hashing & Transaction Signatures
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | BLAKE3 | `Block::calculate_hash` |
//! | `ecdsa` | secp256k1 | Transaction signing/verification |
//!
//! Primitive *choice* (BLAKE3 for hashing, secp256k1 ECDSA for signatures) is
//! the only cryptography this crate commits to; the node specification only
//! cites these two families and leaves exact bit layout to the
//! implementation (§1).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ecdsa;
pub mod errors;
pub mod hashing;

pub use ecdsa::{Secp256k1KeyPair, Secp256k1PublicKey, Secp256k1Signature};
pub use errors::CryptoError;
pub use hashing::{blake3_hash, Blake3Hasher};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
