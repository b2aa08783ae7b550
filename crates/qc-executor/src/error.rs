//! Executor-façade errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    /// `compile` was called with empty source (§4.3: "rejects empty
    /// input").
    #[error("contract source is empty")]
    EmptySource,

    /// The safety analyzer rejected the source before it reached a
    /// sandbox.
    #[error("rejected by safety analyzer: {0}")]
    Rejected(#[from] qc_safety_analyzer::SafetyRejection),

    /// The sandbox session reported a protocol-level failure.
    #[error("sandbox error: {0}")]
    Sandbox(#[from] qc_sandbox::SandboxError),
}
