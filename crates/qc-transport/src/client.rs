//! Outbound side of the transport: open a connection, send one request
//! frame, and collect either a single reply or a stream of reply frames.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::TransportError;
use crate::frame::{self, STREAM_END};
use crate::MAX_FRAME_BYTES;

/// A reply the transport treats as "no answer arrived" rather than a
/// protocol error, per the node's own timeout convention.
const TIMEOUT_REPLY: &str = "ERROR: Timeout";

/// Sends fingerprinted request frames to peers over TCP.
#[derive(Debug, Clone)]
pub struct FrameClient {
    timeout: Duration,
}

impl Default for FrameClient {
    fn default() -> Self {
        Self::new(crate::REQUEST_TIMEOUT)
    }
}

impl FrameClient {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Parses a `tcp://host:port` peer address into a [`SocketAddr`].
    pub fn parse_peer_addr(addr: &str) -> Result<SocketAddr, TransportError> {
        let stripped = addr
            .strip_prefix("tcp://")
            .ok_or_else(|| TransportError::InvalidPeerAddress(addr.to_string()))?;
        stripped
            .parse()
            .map_err(|_| TransportError::InvalidPeerAddress(addr.to_string()))
    }

    /// Sends `payload` to `addr` and waits for a single reply line.
    ///
    /// A reply of [`EMPTY_REPLY`] or [`TIMEOUT_REPLY`], or the timeout
    /// itself elapsing, is surfaced as [`TransportError::Timeout`] — callers
    /// treat all three uniformly as "the peer did not answer".
    pub async fn request(&self, addr: &str, payload: &str) -> Result<String, TransportError> {
        let socket_addr = Self::parse_peer_addr(addr)?;
        match timeout(self.timeout, self.request_inner(socket_addr, payload)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(self.timeout)),
        }
    }

    async fn request_inner(
        &self,
        socket_addr: SocketAddr,
        payload: &str,
    ) -> Result<String, TransportError> {
        let stream = TcpStream::connect(socket_addr)
            .await
            .map_err(|e| TransportError::Connect(socket_addr, e))?;
        let (read_half, mut write_half) = stream.into_split();
        let frame = frame::encode(payload);
        write_half.write_all(frame.as_bytes()).await?;
        write_half.write_all(b"\n").await?;
        write_half.flush().await?;

        let mut reader = BufReader::new(read_half);
        let mut line = String::new();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            return Err(TransportError::ConnectionClosed);
        }
        if line.len() > MAX_FRAME_BYTES {
            return Err(TransportError::FrameTooLarge(line.len()));
        }
        let trimmed = line.trim_end_matches(['\n', '\r']);
        if trimmed.is_empty() || trimmed == TIMEOUT_REPLY {
            return Err(TransportError::Timeout(self.timeout));
        }
        let decoded = frame::decode(trimmed, false)?;
        Ok(decoded.to_string())
    }

    /// Sends `payload` to `addr` and collects every frame the peer writes
    /// back on the same connection until the fingerprinted [`STREAM_END`]
    /// marker is seen or the connection closes.
    ///
    /// Used for `GetChain`: rather than one request per chunk, the server
    /// keeps the connection open and streams chunk frames, which keeps the
    /// transport's request/reply shape intact while still allowing a chain
    /// of arbitrary length to cross in one RPC.
    pub async fn request_stream(
        &self,
        addr: &str,
        payload: &str,
    ) -> Result<Vec<String>, TransportError> {
        let socket_addr = Self::parse_peer_addr(addr)?;
        match timeout(self.timeout, self.request_stream_inner(socket_addr, payload)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(self.timeout)),
        }
    }

    async fn request_stream_inner(
        &self,
        socket_addr: SocketAddr,
        payload: &str,
    ) -> Result<Vec<String>, TransportError> {
        let stream = TcpStream::connect(socket_addr)
            .await
            .map_err(|e| TransportError::Connect(socket_addr, e))?;
        let (read_half, mut write_half) = stream.into_split();
        let frame = frame::encode(payload);
        write_half.write_all(frame.as_bytes()).await?;
        write_half.write_all(b"\n").await?;
        write_half.flush().await?;

        let mut reader = BufReader::new(read_half);
        let mut chunks = Vec::new();
        loop {
            let mut line = String::new();
            let n = reader.read_line(&mut line).await?;
            if n == 0 {
                debug!("peer closed stream without an END frame");
                break;
            }
            if line.len() > MAX_FRAME_BYTES {
                return Err(TransportError::FrameTooLarge(line.len()));
            }
            let trimmed = line.trim_end_matches(['\n', '\r']);
            let decoded = frame::decode(trimmed, false)?;
            if decoded == STREAM_END {
                break;
            }
            chunks.push(decoded.to_string());
        }
        if chunks.is_empty() {
            warn!(peer = %socket_addr, "empty GetChain stream");
        }
        Ok(chunks)
    }
}
