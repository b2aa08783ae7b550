//! # Peer Transport
//!
//! Every message between peers is a single text frame carrying a fixed
//! **assembly fingerprint** prefix as a cheap membership token (§4.4, §6).
//!
//! ## Frame shape
//!
//! Outbound: `<fingerprint>#<payload>`. Inbound: the same fingerprint
//! followed by one separator byte then the payload. The node specification
//! notes (§9) that outbound framing always uses `#` while the inbound parser
//! historically stripped a fixed `len(fingerprint)+1` offset without
//! re-checking which byte that offset lands on — i.e. it tolerates any
//! single separator character, not only `#`. We preserve that: encoding is
//! always `#`, decoding strips by offset and does not re-validate the
//! separator byte itself. See `DESIGN.md` for the full resolution.
//!
//! ## Streaming resolution for `GetChain`
//!
//! The transport is nominally one-shot request/reply, but `GetChain` must
//! return many frames per request (§4.4, §9). We resolve this by keeping a
//! single TCP connection open for the duration of one request cycle: the
//! server may write more than one frame back before closing, and the client
//! reads frames in a loop until it observes the fingerprinted `END` frame or
//! the connection closes. No new connection is opened per chunk.

pub mod client;
pub mod error;
pub mod frame;
pub mod server;

pub use client::FrameClient;
pub use error::TransportError;
pub use frame::ASSEMBLY_FINGERPRINT;
pub use server::{FrameConnection, FrameServer};

/// Default per-request timeout for peer RPCs (§5: "Peer RPCs rely on the
/// transport's own timeout").
pub const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

/// Maximum size of a single received frame (§5: "64 KiB nominal for frame
/// receive").
pub const MAX_FRAME_BYTES: usize = 64 * 1024;

/// Size of one `GetChain` chunk payload before base64 encoding (§4.6, §5).
pub const SYNC_CHUNK_BYTES: usize = 32 * 1024;
