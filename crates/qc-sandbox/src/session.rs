//! A single sandboxed child process and the request/reply pipe protocol
//! layered over its stdio (§3 `ContractExecutionSession`, §4.2).

use std::process::Stdio;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::SandboxError;
use crate::monitor::{self, MemoryBreachFlag, MEMORY_CAP_BYTES};
use crate::protocol::{decode_line, encode_line, Request, Response};

/// Grace period [`ContractExecutionSession::dispose`] waits for the child
/// to exit after a `shutdown` request before force-killing it (§4.2).
pub const DISPOSE_GRACE: Duration = Duration::from_millis(200);

/// One parent-side handle to a single sandboxed child process running the
/// contract-executor host binary.
///
/// Owns both stream halves, the background resource monitor, and the
/// memory cap. At most one child process is alive per session (§3); once
/// [`ContractExecutionSession::dispose`] runs, or the monitor kills the
/// child for a memory breach, the session is no longer usable.
pub struct ContractExecutionSession {
    session_id: Option<String>,
    child: Arc<Mutex<Child>>,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    memory_cap_bytes: u64,
    memory_breached: MemoryBreachFlag,
    monitor_handle: tokio::task::JoinHandle<()>,
    closed: bool,
}

impl ContractExecutionSession {
    /// Launches the sandbox host binary at `host_path`, wires its stdio,
    /// and starts the resource monitor. The session has no `session_id`
    /// until [`Self::compile`] succeeds.
    pub async fn launch(host_path: &std::path::Path) -> Result<Self, SandboxError> {
        Self::launch_with_cap(host_path, MEMORY_CAP_BYTES).await
    }

    /// As [`Self::launch`], with an explicit memory cap — used by tests
    /// that need a tight cap to exercise the breach path quickly.
    pub async fn launch_with_cap(
        host_path: &std::path::Path,
        memory_cap_bytes: u64,
    ) -> Result<Self, SandboxError> {
        let mut command = Command::new(host_path);
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Environment hint for a bounded GC-equivalent heap inside the
            // sandboxed process (§4.2: "writes environment hints for a
            // bounded GC heap").
            .env("QC_SANDBOX_MEMORY_CAP_BYTES", memory_cap_bytes.to_string())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(SandboxError::Spawn)?;
        let pid = child.id().ok_or(SandboxError::UnexpectedEndOfStream)?;
        let stdin = child.stdin.take().ok_or(SandboxError::UnexpectedEndOfStream)?;
        let stdout = child.stdout.take().ok_or(SandboxError::UnexpectedEndOfStream)?;
        let stderr = child.stderr.take();

        if let Some(mut stderr) = stderr {
            tokio::spawn(async move {
                let mut lines = BufReader::new(&mut stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(sandbox_stderr = %line);
                }
            });
        }

        let child = Arc::new(Mutex::new(child));
        let (memory_breached, monitor_handle) =
            monitor::spawn(pid, memory_cap_bytes, Arc::clone(&child));

        info!(pid, memory_cap_bytes, "sandbox session launched");

        Ok(Self {
            session_id: None,
            child,
            stdin,
            stdout: BufReader::new(stdout),
            memory_cap_bytes,
            memory_breached,
            monitor_handle,
            closed: false,
        })
    }

    /// The sandbox's assigned session id, once `compile` has succeeded.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Sends `compile` and records the returned `sessionId` on success.
    pub async fn compile(&mut self, code: &str) -> Result<String, SandboxError> {
        let response = self
            .exchange(Request::Compile {
                code: code.to_string(),
            })
            .await?;
        if !response.success {
            return Err(protocol_failure(response));
        }
        let session_id = response
            .session_id
            .ok_or(SandboxError::MissingField("sessionId"))?;
        self.session_id = Some(session_id.clone());
        Ok(session_id)
    }

    /// Sends `state` and returns the sandbox's normalized state.
    pub async fn transfer_state(&mut self, state: &str) -> Result<String, SandboxError> {
        let response = self
            .exchange(Request::State {
                state: state.to_string(),
            })
            .await?;
        if !response.success {
            return Err(protocol_failure(response));
        }
        response.state.ok_or(SandboxError::MissingField("state"))
    }

    /// Sends `execute`, bounded by `exec_timeout`. On timeout the child is
    /// killed and [`SandboxError::ExecutionTimeout`] is returned — the
    /// caller (the executor façade) is responsible for substituting the
    /// caller-supplied state back in per §4.2/§7.
    pub async fn execute(
        &mut self,
        inputs: Vec<String>,
        state: &str,
        exec_timeout: Duration,
    ) -> Result<(String, String), SandboxError> {
        let request = Request::Execute {
            inputs,
            state: state.to_string(),
        };
        let response = match timeout(exec_timeout, self.exchange(request)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!("execute timed out, killing sandbox child");
                self.kill().await;
                return Err(SandboxError::ExecutionTimeout);
            }
        };
        if !response.success {
            return Err(protocol_failure(response));
        }
        let result = response.result.ok_or(SandboxError::MissingField("result"))?;
        let state = response.state.ok_or(SandboxError::MissingField("state"))?;
        Ok((result, state))
    }

    /// Sends `shutdown`, cancels the monitor, waits up to
    /// [`DISPOSE_GRACE`] for the child to exit, then force-kills it.
    /// Consumes the session — it is unusable afterward.
    pub async fn dispose(mut self) {
        if !self.closed {
            let _ = self.write_request(&Request::Shutdown {}).await;
        }
        self.monitor_handle.abort();
        let mut child = self.child.lock().await;
        let waited = timeout(DISPOSE_GRACE, child.wait()).await;
        if waited.is_err() {
            let _ = child.start_kill();
        }
        self.closed = true;
        debug!("sandbox session disposed");
    }

    async fn kill(&mut self) {
        self.closed = true;
        let mut child = self.child.lock().await;
        let _ = child.start_kill();
    }

    async fn exchange(&mut self, request: Request) -> Result<Response, SandboxError> {
        if self.closed {
            return Err(SandboxError::SessionClosed);
        }
        if self.memory_breached.load(Ordering::SeqCst) {
            self.closed = true;
            return Err(SandboxError::MemoryExceeded(self.memory_cap_bytes));
        }
        self.write_request(&request).await?;
        self.read_response().await
    }

    async fn write_request(&mut self, request: &Request) -> Result<(), SandboxError> {
        let line = encode_line(request)?;
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    async fn read_response(&mut self) -> Result<Response, SandboxError> {
        let mut line = String::new();
        let n = self.stdout.read_line(&mut line).await?;
        if n == 0 {
            self.closed = true;
            if self.memory_breached.load(Ordering::SeqCst) {
                return Err(SandboxError::MemoryExceeded(self.memory_cap_bytes));
            }
            return Err(SandboxError::UnexpectedEndOfStream);
        }
        Ok(decode_line(&line)?)
    }
}

fn protocol_failure(response: Response) -> SandboxError {
    SandboxError::Failed(
        response
            .error
            .unwrap_or_else(|| "sandbox reported failure".to_string()),
    )
}
