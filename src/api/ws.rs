use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::dispatch::{ClientSession, MessageSink, SinkClosed};
use crate::models::ClientRole;

use super::WsState;

/// Query parameters of the upgrade request.
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// "passenger" or "driver"
    role: Option<String>,
}

/// WebSocket endpoint for pickup notifications.
///
/// A connection without a recognized role is accepted but never routed:
/// its frames are dropped and it receives no broadcasts.
pub async fn ws_notifications(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<WsState>,
) -> impl IntoResponse {
    let role = query.role.as_deref().and_then(ClientRole::from_query_param);
    if role.is_none() {
        tracing::warn!(
            role = ?query.role,
            "connection without a recognized role, accepting unrouted"
        );
    }
    ws.on_upgrade(move |socket| handle_socket(socket, state, role))
}

async fn handle_socket(socket: WebSocket, state: WsState, role: Option<ClientRole>) {
    let session_id = Uuid::new_v4().to_string();
    let (mut socket_tx, mut socket_rx) = socket.split();

    // All outbound traffic funnels through this channel so the dispatch
    // core can hand frames to any connection without owning the socket.
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            let closing = matches!(frame, Message::Close(_));
            if socket_tx.send(frame).await.is_err() {
                break;
            }
            if closing {
                break;
            }
        }
    });

    let sink = Arc::new(SocketSink::new(outbound_tx));
    if let Some(role) = role {
        state.dispatcher.handle_connect(
            &session_id,
            ClientSession {
                role,
                sink: sink.clone(),
            },
        );
        tracing::info!(
            session_id = %session_id,
            role = role.as_str(),
            "connection established"
        );
    }

    while let Some(frame) = socket_rx.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                let Some(role) = role else {
                    tracing::debug!(
                        session_id = %session_id,
                        "dropping frame from unrouted connection"
                    );
                    continue;
                };
                if let Err(err) = state.dispatcher.handle_frame(&session_id, role, &text).await {
                    tracing::warn!(
                        session_id = %session_id,
                        error = %err,
                        "closing connection after malformed frame"
                    );
                    break;
                }
            }
            Ok(Message::Ping(_)) => {
                // Axum answers pings automatically
            }
            Ok(Message::Close(_)) => break,
            Err(_) => break,
            _ => {}
        }
    }

    // Runs for clean closes, transport errors, and malformed frames
    // alike; remove/delete are no-ops when the record is already gone.
    state.dispatcher.handle_disconnect(&session_id);
    sink.close();
    let _ = writer.await;
    tracing::info!(session_id = %session_id, "connection closed");
}

/// Production sink: the registry-held half of a connection.
///
/// Sending queues a frame on the writer task's channel; the send fails
/// exactly when the writer side is gone, which is what the retrying
/// broadcaster needs to observe.
pub struct SocketSink {
    outbound: mpsc::UnboundedSender<Message>,
    closed: AtomicBool,
}

impl SocketSink {
    pub fn new(outbound: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            outbound,
            closed: AtomicBool::new(false),
        }
    }
}

impl MessageSink for SocketSink {
    fn send_text(&self, frame: &str) -> Result<(), SinkClosed> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SinkClosed);
        }
        self.outbound
            .send(Message::Text(frame.to_owned().into()))
            .map_err(|_| SinkClosed)
    }

    fn is_open(&self) -> bool {
        !self.closed.load(Ordering::Acquire) && !self.outbound.is_closed()
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            let _ = self.outbound.send(Message::Close(None));
        }
    }
}
