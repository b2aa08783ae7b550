//! The ordered, append-only block chain (§3).

use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use shared_types::Transaction;
use tracing::{info, warn};

use crate::block::Block;
use crate::error::ChainError;

/// An ordered sequence of blocks plus the pending transactions not yet
/// mined. `blocks` is never empty — [`Chain::new`] seeds it with
/// [`Block::genesis`].
#[derive(Debug, Clone)]
pub struct Chain {
    blocks: Vec<Block>,
    pending_transactions: Vec<Transaction>,
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl Chain {
    /// Starts a new chain containing only the genesis block.
    #[must_use]
    pub fn new() -> Self {
        Self {
            blocks: vec![Block::genesis()],
            pending_transactions: Vec::new(),
        }
    }

    /// Number of blocks in the chain, including genesis.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// `true` iff the chain holds only the genesis block.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false // genesis is always present
    }

    /// The most recently appended block.
    #[must_use]
    pub fn latest_block(&self) -> &Block {
        self.blocks.last().expect("chain always has a genesis block")
    }

    /// Read-only view of all blocks, oldest first.
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Read-only view of the pending (unmined) transactions.
    #[must_use]
    pub fn pending_transactions(&self) -> &[Transaction] {
        &self.pending_transactions
    }

    /// Full re-validation: every block's stored `hash` matches
    /// `calculate_hash()`, and every block's `previous_hash` matches its
    /// predecessor's `hash`, in index order starting from genesis.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let genesis = &self.blocks[0];
        if genesis.hash != genesis.calculate_hash() {
            return false;
        }
        self.blocks.windows(2).all(|pair| {
            let (prev, curr) = (&pair[0], &pair[1]);
            curr.hash == curr.calculate_hash()
                && curr.previous_hash == prev.hash
                && curr.index == prev.index + 1
        })
    }

    /// Appends `block` iff it links to the current tip and its hash is
    /// self-consistent. Returns `true` on success; `false` leaves the chain
    /// unchanged.
    pub fn add_block(&mut self, block: Block) -> bool {
        let tip = self.latest_block();
        if block.previous_hash != tip.hash {
            warn!(expected = %tip.hash, got = %block.previous_hash, "block rejected: parent mismatch");
            return false;
        }
        if block.index != tip.index + 1 {
            warn!(expected = tip.index + 1, got = block.index, "block rejected: non-sequential index");
            return false;
        }
        if block.hash != block.calculate_hash() {
            warn!(index = block.index, "block rejected: hash mismatch");
            return false;
        }
        info!(index = block.index, hash = %block.hash, "block accepted");
        self.blocks.push(block);
        true
    }

    /// Validates `tx`'s shape and appends it to the pending set.
    pub fn add_transaction(&mut self, tx: Transaction) -> Result<(), ChainError> {
        tx.validate_shape()?;
        self.pending_transactions.push(tx);
        Ok(())
    }

    /// Mines a new block from every currently pending transaction, crediting
    /// `miner_addr` a fixed mining reward, and appends it to the chain.
    /// Clears the pending set on success.
    pub fn mine_pending_transactions(&mut self, miner_addr: &str, now: i64) -> Block {
        let mut transactions = std::mem::take(&mut self.pending_transactions);
        transactions.push(Transaction::new(
            "smartX0000000000000000000000000000000000000000",
            miner_addr,
            MINING_REWARD,
            Vec::new(),
            "mining reward",
            now,
        ));

        let tip = self.latest_block();
        let block = Block::new(tip.index + 1, now, transactions, tip.hash.clone());
        info!(index = block.index, txs = block.transactions.len(), "mined block");
        self.blocks.push(block.clone());
        block
    }

    /// Serializes the chain to `path` as an opaque byte stream. The format
    /// is a private implementation detail — no other subsystem parses it
    /// directly; chain exchange always goes through [`Chain::load`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ChainError> {
        let bytes = bincode::serialize(&self.blocks)?;
        fs::write(path, bytes)?;
        Ok(())
    }

    /// Loads a chain previously written by [`Chain::save`] (or assembled
    /// from `GetChain` chunks into the same format by the sync engine).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ChainError> {
        let bytes = fs::read(path)?;
        let blocks: Vec<Block> = bincode::deserialize(&bytes)?;
        Ok(Self {
            blocks,
            pending_transactions: Vec::new(),
        })
    }
}

/// Fixed mining reward credited to the address that mined a block.
const MINING_REWARD: Decimal = Decimal::from_parts(100, 0, 0, false, 0);
