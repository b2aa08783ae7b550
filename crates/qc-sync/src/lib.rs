//! # Sync Engine
//!
//! Chain-length comparison against peers, chunked chain download, and
//! atomic replacement of the local chain (§4.6).
//!
//! Downloading is driven entirely from here; the peer-facing `GetChain`
//! responder uses [`serve_chain_chunks`] to produce the same chunk shape
//! this crate's own client side consumes, keeping both ends of the
//! exchange symmetric.

pub mod engine;
pub mod error;

pub use engine::{is_chain_current, serve_chain_chunks, sync_if_behind, SyncOutcome};
pub use error::SyncError;
