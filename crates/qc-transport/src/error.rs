use std::net::SocketAddr;

/// Failures that can occur while sending or receiving a frame.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("malformed peer address {0:?}, expected tcp://host:port")]
    InvalidPeerAddress(String),

    #[error("connect to {0} failed: {1}")]
    Connect(SocketAddr, #[source] std::io::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame exceeded {0} bytes")]
    FrameTooLarge(usize),

    #[error("frame missing assembly fingerprint")]
    MissingFingerprint,

    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("peer closed the connection before replying")]
    ConnectionClosed,
}
