//! The accepting server endpoint (§4.9: `bound → accepting → (accepting |
//! closed-on-error → rebind)`, terminal only on fatal bind failure).

use std::sync::Arc;

use qc_transport::FrameServer;
use tracing::{error, info, warn};

use crate::context::NodeContext;
use crate::error::DispatcherError;
use crate::handlers::{dispatch, DispatchReply};

/// Binds `addr` and serves forever. An error reading or routing one
/// connection closes that listener and rebinds a fresh one at the same
/// address rather than propagating (§4.9); only a bind failure itself is
/// fatal.
pub async fn serve(addr: &str, ctx: Arc<NodeContext>) -> Result<(), DispatcherError> {
    loop {
        let server = FrameServer::bind(addr, ctx.debug)
            .await
            .map_err(|source| DispatcherError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        info!(addr, "dispatcher bound, accepting connections");

        loop {
            match server.accept().await {
                Ok(conn) => {
                    let ctx = Arc::clone(&ctx);
                    tokio::spawn(async move {
                        let peer = conn.peer_addr();
                        let request = conn.request().to_string();
                        match dispatch(&ctx, &request).await {
                            DispatchReply::Single(reply) => {
                                if let Err(e) = conn.reply(&reply).await {
                                    warn!(%peer, error = %e, "failed to send reply");
                                }
                            }
                            DispatchReply::Stream(chunks) => {
                                if let Err(e) = conn.reply_stream(chunks).await {
                                    warn!(%peer, error = %e, "failed to stream reply");
                                }
                            }
                            DispatchReply::None => {}
                        }
                    });
                }
                Err(e) => {
                    error!(addr, error = %e, "accept failed, closing listener and rebinding");
                    break;
                }
            }
        }
    }
}
