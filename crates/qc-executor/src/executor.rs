//! The `compile -> transfer_state -> execute` façade (§4.3).

use std::path::{Path, PathBuf};
use std::time::Duration;

use qc_sandbox::{ContractExecutionSession, EXECUTION_TIMEOUT};
use tracing::{error, warn};

use crate::error::ExecutorError;
use crate::result::ContractExecutionResult;

/// Pipelines a contract's source through the safety analyzer and a sandbox
/// session. Stateless itself — all per-contract state lives in the
/// [`ContractExecutionSession`] a call to [`ContractExecutor::compile`]
/// returns.
#[derive(Debug, Clone)]
pub struct ContractExecutor {
    host_path: PathBuf,
    execution_timeout: Duration,
}

impl Default for ContractExecutor {
    fn default() -> Self {
        Self::new(default_host_path())
    }
}

impl ContractExecutor {
    #[must_use]
    pub fn new(host_path: PathBuf) -> Self {
        Self {
            host_path,
            execution_timeout: EXECUTION_TIMEOUT,
        }
    }

    /// Overrides the execution timeout. Used by tests that need the
    /// timeout path to trip quickly.
    #[must_use]
    pub fn with_execution_timeout(mut self, timeout: Duration) -> Self {
        self.execution_timeout = timeout;
        self
    }

    /// Rejects empty input, runs the safety analyzer, launches a sandbox
    /// session, and sends `compile`. On any failure the session (if one was
    /// launched) is disposed before the error is surfaced (§4.3).
    pub async fn compile(
        &self,
        code: &str,
    ) -> Result<ContractExecutionSession, ExecutorError> {
        if code.trim().is_empty() {
            return Err(ExecutorError::EmptySource);
        }
        qc_safety_analyzer::analyze(code)?;

        let mut session = ContractExecutionSession::launch(&self.host_path)
            .await
            .map_err(ExecutorError::Sandbox)?;
        match session.compile(code).await {
            Ok(_) => Ok(session),
            Err(e) => {
                warn!(error = %e, "sandbox rejected compile, disposing session");
                session.dispose().await;
                Err(ExecutorError::Sandbox(e))
            }
        }
    }

    /// Sends `state` and returns the sandbox's sanitized state, or the
    /// original `state` unchanged if the protocol call itself fails
    /// (§4.3: "returns the original on a protocol failure").
    pub async fn transfer_state(
        &self,
        session: &mut ContractExecutionSession,
        state: &str,
    ) -> String {
        match session.transfer_state(state).await {
            Ok(normalized) => normalized,
            Err(e) => {
                warn!(error = %e, "state transfer failed, keeping caller's state");
                state.to_string()
            }
        }
    }

    /// Runs `execute` bounded by the configured execution timeout. Both a
    /// timeout and any thrown sandbox error terminate the session and
    /// return an error result that preserves the caller's `state` (§4.3,
    /// §7).
    pub async fn execute(
        &self,
        session: &mut ContractExecutionSession,
        inputs: Vec<String>,
        state: &str,
    ) -> ContractExecutionResult {
        match session.execute(inputs, state, self.execution_timeout).await {
            Ok((result, new_state)) => ContractExecutionResult::ok(result, new_state),
            Err(qc_sandbox::SandboxError::ExecutionTimeout) => {
                ContractExecutionResult::timeout(state)
            }
            Err(e) => {
                error!(error = %e, "execute failed, session terminated");
                ContractExecutionResult::execution_failed(e, state)
            }
        }
    }

    /// Runs the whole `compile -> transfer_state -> execute` pipeline for
    /// one call, disposing the session when it's done either way.
    ///
    /// A safety-analyzer rejection never reaches a sandbox at all — it is
    /// surfaced as [`ContractExecutionResult::forbidden`] with the
    /// caller's `state` left untouched (§8 Scenario 1: source containing
    /// `System.IO.File.ReadAllText(...)` yields a result starting with
    /// `"Forbidden"` and state `"initial"`). Any other compile failure is
    /// reported the same way `execute` reports a sandbox error.
    pub async fn run(
        &self,
        code: &str,
        inputs: Vec<String>,
        state: &str,
    ) -> ContractExecutionResult {
        let mut session = match self.compile(code).await {
            Ok(session) => session,
            Err(ExecutorError::Rejected(reason)) => {
                return ContractExecutionResult::forbidden(reason, state);
            }
            Err(e) => {
                warn!(error = %e, "compile failed, session never reached execute");
                return ContractExecutionResult::execution_failed(e, state);
            }
        };

        let normalized_state = self.transfer_state(&mut session, state).await;
        let result = self.execute(&mut session, inputs, &normalized_state).await;
        session.dispose().await;
        result
    }
}

fn default_host_path() -> PathBuf {
    let name = if cfg!(windows) {
        "qc-sandbox-host.exe"
    } else {
        "qc-sandbox-host"
    };
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .map(|dir| dir.join(name))
        .unwrap_or_else(|| PathBuf::from(name))
}
