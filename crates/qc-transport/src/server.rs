//! Inbound side of the transport: accept connections, validate the
//! fingerprint on the request frame, and let the caller write back either a
//! single reply frame or a stream of chunk frames terminated by `END`.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use crate::error::TransportError;
use crate::frame::{self, STREAM_END};
use crate::MAX_FRAME_BYTES;

/// A bound listener accepting fingerprinted frame connections.
pub struct FrameServer {
    listener: TcpListener,
    debug: bool,
}

impl FrameServer {
    /// Binds `addr`. `debug` disables the fingerprint check on every
    /// connection accepted from this listener, matching §4.4's inbound
    /// debug-mode exemption.
    pub async fn bind(addr: impl tokio::net::ToSocketAddrs, debug: bool) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, debug })
    }

    /// Local address this server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts the next inbound connection and reads its request frame.
    pub async fn accept(&self) -> Result<FrameConnection, TransportError> {
        let (stream, peer_addr) = self.listener.accept().await?;
        FrameConnection::new(stream, peer_addr, self.debug).await
    }
}

/// One accepted connection with its request frame already read. The
/// handler replies by calling [`FrameConnection::reply`] or
/// [`FrameConnection::reply_stream`] and the connection is then dropped,
/// closing it — the state machine around repeated accept/reply/close lives
/// in the dispatcher, not here.
pub struct FrameConnection {
    stream: TcpStream,
    peer_addr: std::net::SocketAddr,
    request: String,
}

impl FrameConnection {
    async fn new(
        mut stream: TcpStream,
        peer_addr: std::net::SocketAddr,
        debug: bool,
    ) -> Result<Self, TransportError> {
        let mut reader = BufReader::new(&mut stream);
        let mut line = String::new();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            return Err(TransportError::ConnectionClosed);
        }
        if line.len() > MAX_FRAME_BYTES {
            return Err(TransportError::FrameTooLarge(line.len()));
        }
        let trimmed = line.trim_end_matches(['\n', '\r']);
        let request = frame::decode(trimmed, debug)?.to_string();
        Ok(Self {
            stream,
            peer_addr,
            request,
        })
    }

    /// The peer's socket address.
    #[must_use]
    pub fn peer_addr(&self) -> std::net::SocketAddr {
        self.peer_addr
    }

    /// The decoded request payload, with the fingerprint already stripped.
    #[must_use]
    pub fn request(&self) -> &str {
        &self.request
    }

    /// Writes a single fingerprinted reply frame and closes the connection.
    pub async fn reply(mut self, payload: &str) -> Result<(), TransportError> {
        let frame = frame::encode(payload);
        self.stream.write_all(frame.as_bytes()).await?;
        self.stream.write_all(b"\n").await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Writes every item of `chunks` as its own fingerprinted frame,
    /// followed by the [`STREAM_END`] sentinel frame, then closes the
    /// connection. Used to answer `GetChain`.
    pub async fn reply_stream<I>(mut self, chunks: I) -> Result<(), TransportError>
    where
        I: IntoIterator<Item = String>,
    {
        for chunk in chunks {
            let frame = frame::encode(&chunk);
            self.stream.write_all(frame.as_bytes()).await?;
            self.stream.write_all(b"\n").await?;
        }
        let end = frame::encode(STREAM_END);
        self.stream.write_all(end.as_bytes()).await?;
        self.stream.write_all(b"\n").await?;
        self.stream.flush().await?;
        Ok(())
    }
}
