//! # Contract Executor
//!
//! The front façade over the Contract Execution Subsystem (§4.3): rejects
//! empty or unsafe source, pipelines `compile -> transfer_state -> execute`
//! through a single [`qc_sandbox::ContractExecutionSession`], and exposes a
//! process-wide singleton instance callers may swap out for tests.

pub mod error;
pub mod executor;
pub mod result;
pub mod singleton;

pub use error::ExecutorError;
pub use executor::ContractExecutor;
pub use result::ContractExecutionResult;
pub use singleton::{global, set_global};
