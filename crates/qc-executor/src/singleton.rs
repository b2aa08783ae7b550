//! The process-wide executor instance (§4.3: "There is a process-wide
//! single instance of the executor, lazily initialized on first use with
//! atomic publication; callers may replace it... with an explicit setter").
//!
//! Rust's type system already rejects "nil" here — [`set_global`] takes an
//! owned `Arc<ContractExecutor>`, so there is no null-reference case left
//! to guard against; the setter's only job is the atomic swap.

use std::sync::{Arc, OnceLock, RwLock};

use crate::executor::ContractExecutor;

static INSTANCE: OnceLock<RwLock<Arc<ContractExecutor>>> = OnceLock::new();

/// Returns the current process-wide executor, constructing the default one
/// on first call.
#[must_use]
pub fn global() -> Arc<ContractExecutor> {
    INSTANCE
        .get_or_init(|| RwLock::new(Arc::new(ContractExecutor::default())))
        .read()
        .expect("executor instance lock poisoned")
        .clone()
}

/// Atomically replaces the process-wide executor — used by tests and by a
/// host process that needs a non-default sandbox host path.
pub fn set_global(executor: Arc<ContractExecutor>) {
    let lock = INSTANCE.get_or_init(|| RwLock::new(Arc::clone(&executor)));
    *lock.write().expect("executor instance lock poisoned") = executor;
}
