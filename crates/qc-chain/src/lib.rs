//! # Chain Data Model
//!
//! The append-only block chain: block hashing, mining, full-chain
//! validation, and opaque on-disk persistence (§3, §4.6/§4.7 of the node
//! specification).
//!
//! On-disk format is intentionally opaque outside this crate — peers treat
//! `save`/`load` as a byte-stream round trip and never parse the file
//! directly (§1: "On-disk serialization of the chain" is out of scope as a
//! format, only as a `save`/`load` contract).

pub mod block;
pub mod chain;
pub mod error;
pub mod handle;

pub use block::{Block, BlockCodecError};
pub use chain::Chain;
pub use error::ChainError;
pub use handle::ChainHandle;
