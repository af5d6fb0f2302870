//! Connection handler module
//!
//! Handles the lifecycle of one client connection:
//! - WebSocket upgrade and session creation
//! - writer task draining the session's outbound channel into text frames
//! - read loop decoding client events and running them through the broadcaster
//! - disconnect cleanup, exactly once, on stream end or error

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, WebSocketStream};
use tracing::{debug, info, trace, warn};
use tungstenite::Message;

use crate::error::{NetworkError, Result, TownsyncError};
use crate::protocol::{ClientEvent, PlayerId};
use crate::AppState;

/// Connection handler for processing client connections
pub struct ConnectionHandler {
    /// Shared application state
    state: Arc<AppState>,
}

impl ConnectionHandler {
    /// Create a new connection handler
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Handle a client connection from accept to disconnect cleanup
    pub async fn handle(&self, stream: TcpStream, addr: SocketAddr) -> Result<()> {
        debug!(address = %addr, "Handling connection");

        stream.set_nodelay(true)?;

        let ws_stream = accept_async(stream)
            .await
            .map_err(|e| TownsyncError::Network(NetworkError::WebSocket(e.to_string())))?;

        let (outbound_tx, outbound_rx) =
            mpsc::channel(self.state.config.outbound_capacity);
        let session = self.state.sessions.create_session(addr, outbound_tx)?;
        let session_id = session.id;

        info!(session_id = session_id, address = %addr, "WebSocket connection established");

        let (sink, source) = ws_stream.split();
        let writer = tokio::spawn(write_outbound(sink, outbound_rx, session_id));

        let result = self.read_loop(source, session_id).await;

        // Cleanup: tear down the registry record and tell everyone still
        // connected, then release the session so the writer task ends.
        let outbound = self.state.broadcaster.handle_disconnect(session_id);
        self.state.sessions.remove(session_id);
        self.state.sessions.dispatch(outbound);
        drop(session);

        let _ = writer.await;
        debug!(session_id = session_id, "Connection handler ending");

        result
    }

    /// Decode inbound frames and dispatch them until the stream ends
    async fn read_loop(
        &self,
        mut source: SplitStream<WebSocketStream<TcpStream>>,
        session_id: PlayerId,
    ) -> Result<()> {
        while let Some(message) = source.next().await {
            match message {
                Ok(Message::Text(text)) => match ClientEvent::from_json(&text) {
                    Ok(event) => {
                        trace!(session_id = session_id, event = ?event, "Inbound event");
                        let outbound = self.state.broadcaster.handle(session_id, event);
                        self.state.sessions.dispatch(outbound);
                    }
                    Err(e) => {
                        // Transport is trusted to deliver well-formed events;
                        // anything else is dropped, not fatal.
                        warn!(session_id = session_id, error = %e, "Dropped malformed frame");
                    }
                },
                Ok(Message::Binary(data)) => {
                    warn!(
                        session_id = session_id,
                        len = data.len(),
                        "Dropped unexpected binary frame"
                    );
                }
                Ok(Message::Close(_)) => {
                    debug!(session_id = session_id, "Close frame received");
                    break;
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => {
                    // Control frames are handled by the transport layer
                }
                Err(e) => {
                    debug!(session_id = session_id, error = %e, "Read error");
                    return Err(TownsyncError::Network(NetworkError::WebSocket(
                        e.to_string(),
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Forward queued outbound events to the socket as JSON text frames.
/// Ends when the session is removed (channel closed) or the peer goes away.
async fn write_outbound(
    mut sink: futures_util::stream::SplitSink<WebSocketStream<TcpStream>, Message>,
    mut outbound_rx: mpsc::Receiver<crate::protocol::ServerEvent>,
    session_id: PlayerId,
) {
    while let Some(event) = outbound_rx.recv().await {
        let text = match event.to_json() {
            Ok(text) => text,
            Err(e) => {
                warn!(session_id = session_id, error = %e, "Failed to encode event");
                continue;
            }
        };
        if sink.send(Message::Text(text)).await.is_err() {
            debug!(session_id = session_id, "Writer ending: peer gone");
            break;
        }
    }
    let _ = sink.close().await;
}
