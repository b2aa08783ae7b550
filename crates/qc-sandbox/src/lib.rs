//! # Sandbox Session
//!
//! One child process per compiled contract (§3, §4.2): the parent speaks a
//! line-delimited JSON protocol over the child's stdio, and a background
//! task polls its working set every 250 ms, killing it (and anything it
//! spawned) on a memory breach.
//!
//! The actual host binary the session launches lives in the sibling
//! `qc-sandbox-host` crate; this crate owns only the parent-side handle and
//! the wire shape both ends agree on.

pub mod error;
pub mod monitor;
pub mod protocol;
pub mod session;

pub use error::SandboxError;
pub use monitor::MEMORY_CAP_BYTES;
pub use session::{ContractExecutionSession, DISPOSE_GRACE};

/// Hard execution timeout imposed by the parent on `execute` (§4.2, §5).
pub const EXECUTION_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);
