//! Echo handler for a single WebSocket connection.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::accept_async_with_config;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tracing::{debug, info, trace};

use super::message::{classify, kind, payload_text, Action};
use crate::error::{Error, Result};

/// Build the tungstenite configuration for accepted connections.
pub fn websocket_config(max_message_size: usize, max_frame_size: usize) -> WebSocketConfig {
    let mut config = WebSocketConfig::default();
    config.max_message_size = Some(max_message_size);
    config.max_frame_size = Some(max_frame_size);
    config
}

/// Handle an echo connection.
///
/// Performs the WebSocket upgrade on `stream`, then logs and echoes every
/// data message until the peer closes or the transport fails. A failed echo
/// write is not retried; it ends the connection with [`Error::Send`].
pub async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    config: WebSocketConfig,
) -> Result<()> {
    let mut ws = accept_async_with_config(stream, Some(config))
        .await
        .map_err(Error::Connection)?;

    debug!(peer = %peer, "WebSocket connection established");

    while let Some(msg) = ws.next().await {
        let msg = msg.map_err(Error::Connection)?;

        match classify(msg) {
            Action::Echo(msg) => {
                info!(
                    peer = %peer,
                    kind = kind(&msg),
                    len = msg.len(),
                    "received: {}",
                    payload_text(&msg)
                );
                ws.send(msg).await.map_err(Error::Send)?;
            }
            // Keep polling so the close reply gets flushed; the stream ends after it.
            Action::Close => trace!(peer = %peer, "Close frame received"),
            Action::Ignore => {}
        }
    }

    debug!(peer = %peer, "Connection closed");
    Ok(())
}
