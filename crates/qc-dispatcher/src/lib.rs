//! # Message Dispatcher
//!
//! Parses peer frames, routes to the handler for each tag, and runs the
//! accept/rebind server loop (§4.4, §4.9).

pub mod compression;
pub mod context;
pub mod error;
pub mod handlers;
pub mod server;

pub use context::{now_unix, NodeContext};
pub use error::DispatcherError;
pub use handlers::{dispatch, DispatchReply};
pub use server::serve;
