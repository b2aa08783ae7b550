//! A concurrently-readable handle to the single writer-owned [`Chain`]
//! (§5: "replace-chain during sync must be atomic from readers' view (swap
//! a handle)").

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::Chain;

/// Many readers may [`ChainHandle::load`] a consistent snapshot at any
/// time; the sync engine and the admission path are the only writers, and
/// they replace the whole chain at once via [`ChainHandle::swap`] rather
/// than mutating it in place.
#[derive(Debug, Default)]
pub struct ChainHandle(ArcSwap<Chain>);

impl ChainHandle {
    #[must_use]
    pub fn new(chain: Chain) -> Self {
        Self(ArcSwap::from_pointee(chain))
    }

    /// A consistent snapshot of the chain as of this call.
    #[must_use]
    pub fn load(&self) -> Arc<Chain> {
        self.0.load_full()
    }

    /// Atomically replaces the chain. Readers that already hold an `Arc`
    /// from a prior [`Self::load`] keep seeing the old snapshot; any new
    /// `load` sees `chain`.
    pub fn swap(&self, chain: Chain) {
        self.0.store(Arc::new(chain));
    }
}
