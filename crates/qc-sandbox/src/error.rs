//! Sandbox-subsystem errors (§7: "Sandbox protocol error").

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SandboxError {
    /// The child process could not be spawned at all.
    #[error("failed to launch sandbox host process: {0}")]
    Spawn(#[source] std::io::Error),

    /// A read or write on the child's stdio pipes failed.
    #[error("sandbox io error: {0}")]
    Io(#[from] std::io::Error),

    /// A line received from the child did not decode as the expected
    /// response shape.
    #[error("malformed sandbox response: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    /// A synchronous read observed EOF on the child's stdout — §4.2: "On
    /// any synchronous read after the process exits the session reports
    /// 'unexpected end of stream'."
    #[error("unexpected end of stream")]
    UnexpectedEndOfStream,

    /// `execute` did not complete within the execution timeout (§4.2).
    #[error("execution timeout")]
    ExecutionTimeout,

    /// The resource monitor observed the child's working set exceed the
    /// memory cap and killed it (§4.2, §5).
    #[error("sandbox exceeded memory cap of {0} bytes and was terminated")]
    MemoryExceeded(u64),

    /// The session had already been disposed or killed.
    #[error("sandbox session is no longer usable")]
    SessionClosed,

    /// The sandbox replied `{ "success": false, "error": ... }`.
    #[error("{0}")]
    Failed(String),

    /// A response claimed success but omitted a field its message type
    /// requires (§4.2's response-fields table).
    #[error("sandbox response missing required field {0:?}")]
    MissingField(&'static str),
}
