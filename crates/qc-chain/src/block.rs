//! The mined block (§3: "opaque to this spec except three contracts").

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use shared_crypto::blake3_hash;
use shared_types::Transaction;

/// A mined block: an ordered batch of transactions linked to its parent by
/// hash.
///
/// The three contracts the rest of the system relies on are
/// [`Block::calculate_hash`], the `hash` field it must match, and the
/// [`Block::to_base64`]/[`Block::verify_base64`] pair used as the Snowman
/// vote payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: i64,
    pub transactions: Vec<Transaction>,
    pub previous_hash: String,
    pub nonce: u64,
    pub hash: String,
}

impl Block {
    /// Builds and hashes a new block. Callers that need a specific `hash`
    /// field distinct from the freshly computed one (there is no such
    /// legitimate use within this crate) must set it after construction.
    #[must_use]
    pub fn new(
        index: u64,
        timestamp: i64,
        transactions: Vec<Transaction>,
        previous_hash: String,
    ) -> Self {
        let mut block = Self {
            index,
            timestamp,
            transactions,
            previous_hash,
            nonce: 0,
            hash: String::new(),
        };
        block.hash = block.calculate_hash();
        block
    }

    /// The genesis block: index 0, no transactions, all-zero parent hash.
    #[must_use]
    pub fn genesis() -> Self {
        Self::new(0, 0, Vec::new(), "0".repeat(64))
    }

    /// Recomputes the block's hash from its current fields. A block is
    /// accepted only when this equals `hash` (§3 invariant).
    #[must_use]
    pub fn calculate_hash(&self) -> String {
        let canonical = CanonicalBlock {
            index: self.index,
            timestamp: self.timestamp,
            transactions: &self.transactions,
            previous_hash: &self.previous_hash,
            nonce: self.nonce,
        };
        let bytes = bincode::serialize(&canonical).expect("canonical block serializes");
        hex::encode(blake3_hash(&bytes))
    }

    /// Encodes the block as base64 — the vote payload `Vote:<base64-block>`
    /// and the chunk payload sent by `GetChain` both carry this form.
    pub fn to_base64(&self) -> Result<String, BlockCodecError> {
        let bytes = bincode::serialize(self)?;
        Ok(STANDARD.encode(bytes))
    }

    /// Decodes a block previously produced by [`Block::to_base64`].
    pub fn from_base64(encoded: &str) -> Result<Self, BlockCodecError> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|_| BlockCodecError::InvalidBase64)?;
        Ok(bincode::deserialize(&bytes)?)
    }

    /// `true` iff `msg` decodes as a block whose `calculate_hash()` equals
    /// its `hash` field — the check a Snowman voter peer performs before
    /// replying `"OK"` to a `Vote:` message (§4.8).
    #[must_use]
    pub fn verify_base64(msg: &str) -> bool {
        match Self::from_base64(msg) {
            Ok(block) => block.calculate_hash() == block.hash,
            Err(_) => false,
        }
    }
}

/// The subset of a block's fields that feed its hash — excludes `hash`
/// itself so the hash doesn't depend on a value it produces.
#[derive(Serialize)]
struct CanonicalBlock<'a> {
    index: u64,
    timestamp: i64,
    transactions: &'a [Transaction],
    previous_hash: &'a str,
    nonce: u64,
}

/// Errors decoding a base64-encoded block.
#[derive(Debug, thiserror::Error)]
pub enum BlockCodecError {
    #[error("invalid base64")]
    InvalidBase64,
    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),
}
