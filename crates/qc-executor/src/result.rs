//! The shape every `execute` call returns (§3 `ContractExecutionResult`).

/// A contract invocation's outcome. Failures carry a human-readable error
/// message in `result` and leave `serialized_state` as the caller supplied
/// it — the state is never corrupted by a failed execution (§3, §7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractExecutionResult {
    pub result: String,
    pub serialized_state: String,
}

impl ContractExecutionResult {
    #[must_use]
    pub fn ok(result: impl Into<String>, serialized_state: impl Into<String>) -> Self {
        Self {
            result: result.into(),
            serialized_state: serialized_state.into(),
        }
    }

    /// An error outcome that preserves `caller_state` unchanged.
    #[must_use]
    pub fn error(message: impl Into<String>, caller_state: impl Into<String>) -> Self {
        Self {
            result: message.into(),
            serialized_state: caller_state.into(),
        }
    }

    #[must_use]
    pub fn timeout(caller_state: impl Into<String>) -> Self {
        Self::error("Execution timeout", caller_state)
    }

    #[must_use]
    pub fn execution_failed(reason: impl std::fmt::Display, caller_state: impl Into<String>) -> Self {
        Self::error(format!("Execution failed: {reason}"), caller_state)
    }

    #[must_use]
    pub fn forbidden(reason: impl std::fmt::Display, caller_state: impl Into<String>) -> Self {
        Self::error(format!("Forbidden: {reason}"), caller_state)
    }
}
