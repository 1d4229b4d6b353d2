//! WebSocket chat endpoint.
//!
//! `/chat/{owner}/{repo}/{client_id}` upgrades to a WebSocket. The
//! connection task hands the sending half to the session registry, then
//! pumps inbound text frames through `handle_message` one at a time --
//! each message is answered fully before the next frame is read, so
//! responses within a session always arrive in query order. Whatever way
//! the loop ends, the session is evicted from the registry.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures_util::SinkExt;
use futures_util::stream::{SplitSink, StreamExt};

use repotalk_core::chat::SessionTransport;
use repotalk_types::error::TransportError;

use crate::state::AppState;

/// Session transport backed by the sending half of an axum WebSocket.
pub struct WsTransport {
    sender: SplitSink<WebSocket, Message>,
}

impl SessionTransport for WsTransport {
    async fn send(&mut self, text: &str) -> Result<(), TransportError> {
        self.sender
            .send(Message::Text(text.to_owned().into()))
            .await
            .map_err(|err| TransportError::Closed(err.to_string()))
    }

    async fn close(&mut self) {
        // The peer may already be gone; nothing useful to do on failure.
        let _ = self.sender.close().await;
    }
}

/// Upgrade an HTTP request to a WebSocket chat session.
pub async fn chat_ws_handler(
    ws: WebSocketUpgrade,
    Path((owner, repo, client_id)): Path<(String, String, String)>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_chat_socket(socket, state, owner, repo, client_id))
}

/// Core connection handler: open, pump messages, always evict.
async fn handle_chat_socket(
    socket: WebSocket,
    state: AppState,
    owner: String,
    repo: String,
    client_id: String,
) {
    let (sender, mut receiver) = socket.split();
    let transport = WsTransport { sender };

    match state
        .registry
        .open(transport, &client_id, &owner, &repo)
        .await
    {
        Ok(true) => {
            tracing::info!(%client_id, "client connected");
        }
        Ok(false) => {
            // A user-facing failure token was already sent and the
            // transport closed; nothing was stored.
            return;
        }
        Err(err) => {
            tracing::error!(%client_id, owner, repo, error = %err, "session open failed");
            return;
        }
    }

    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                if let Err(err) = state.registry.handle_message(&client_id, text.as_str()).await {
                    tracing::error!(%client_id, error = %err, "generation failed, dropping session");
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Err(err) => {
                tracing::debug!(%client_id, error = %err, "WebSocket receive error");
                break;
            }
            // Binary frames are not part of the protocol; ping/pong are
            // handled by the underlying stack.
            Ok(_) => {}
        }
    }

    state.registry.close(&client_id).await;
    tracing::info!(%client_id, "client disconnected");
}
