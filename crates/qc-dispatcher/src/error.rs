//! Dispatcher/server errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatcherError {
    /// The listener could not be (re)bound — terminal per the server
    /// endpoint's state machine (§4.9: "Terminal state only on fatal bind
    /// failure").
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}
