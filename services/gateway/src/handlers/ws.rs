//! WebSocket endpoint for transaction chat rooms
//!
//! The handshake authenticates the bearer credential before the upgrade
//! completes; an unverifiable connection never reaches the socket loop.
//! After upgrade the connection is tagged with its user id for life.
//!
//! Socket-side failures (non-participant sends, unknown transactions,
//! blank content, rate limits) are dropped without an error frame to the
//! sender, so authorization details never leak over the socket channel.

use crate::auth::bearer_token;
use crate::error::AppError;
use crate::rooms::RoomEvent;
use crate::state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::collections::HashSet;
use tokio::sync::{broadcast, mpsc};
use types::errors::AuthError;
use types::ids::{TransactionId, UserId};

/// Outbound frames buffered per connection before backpressure
const OUTBOUND_BUFFER: usize = 64;

/// Handshake query parameters
#[derive(Debug, Deserialize)]
pub struct WsParams {
    token: Option<String>,
}

/// Frames clients send over the socket
#[derive(Debug, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
enum ClientFrame {
    JoinRoom {
        transaction_id: TransactionId,
    },
    SendMessage {
        transaction_id: TransactionId,
        content: String,
    },
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    // Credential from the query string or the Authorization header;
    // verification failure terminates the connection before upgrade
    let token = params
        .token
        .or_else(|| {
            headers
                .get("Authorization")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| bearer_token(value).map(str::to_string))
        })
        .ok_or(AuthError::MissingCredentials)?;

    let user_id = state.verifier.verify(&token)?;

    state
        .rate_limiter
        .check_rate_limit(&format!("{}:ws_connections", user_id), 10, 1.0)?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user_id)))
}

async fn handle_socket(socket: WebSocket, state: AppState, user_id: UserId) {
    let (mut sink, mut stream) = socket.split();

    // Writer task drains a single outbound queue so room forwarders never
    // contend for the socket itself
    let (out_tx, mut out_rx) = mpsc::channel::<String>(OUTBOUND_BUFFER);
    let writer = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    let mut joined: HashSet<TransactionId> = HashSet::new();
    let mut forwarders = Vec::new();

    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => {
                let Ok(frame) = serde_json::from_str::<ClientFrame>(text.as_str()) else {
                    tracing::debug!(user_id = %user_id, "unparseable client frame");
                    continue;
                };
                match frame {
                    ClientFrame::JoinRoom { transaction_id } => {
                        // No authorization at join time; the coordinator
                        // enforces the real boundary on save and fetch
                        if joined.insert(transaction_id) {
                            let receiver = state.hub.subscribe(transaction_id);
                            forwarders.push(spawn_forwarder(receiver, out_tx.clone()));
                        }
                    }
                    ClientFrame::SendMessage {
                        transaction_id,
                        content,
                    } => {
                        handle_send(&state, user_id, transaction_id, &content).await;
                    }
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    // Dropping the forwarders drops their room receivers; empty rooms are
    // pruned on the next publish. No other session cleanup.
    for forwarder in forwarders {
        forwarder.abort();
    }
    writer.abort();
}

/// Forward room events to this connection's outbound queue
fn spawn_forwarder(
    mut receiver: broadcast::Receiver<RoomEvent>,
    out_tx: mpsc::Sender<String>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if out_tx.send(event.to_frame()).await.is_err() {
                        break;
                    }
                }
                // A lagged receiver skips what it missed; reconnecting
                // clients replay history through the detail fetch
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "room receiver lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// Persist and fan out one chat message; failures are silent by design
async fn handle_send(
    state: &AppState,
    user_id: UserId,
    transaction_id: TransactionId,
    content: &str,
) {
    if content.trim().is_empty() {
        return;
    }

    if state
        .rate_limiter
        .check_rate_limit(&format!("{}:send_message", user_id), 30, 5.0)
        .is_err()
    {
        return;
    }

    match state
        .coordinator
        .save_message(transaction_id, user_id, content)
        .await
    {
        Ok(view) => {
            state.hub.publish(
                transaction_id,
                RoomEvent::NewMessage {
                    id: view.id,
                    content: view.content,
                    sender_id: view.sender_id,
                    sender_first_name: view.sender_first_name,
                    created_at: view.created_at,
                },
            );
        }
        Err(err) => {
            tracing::debug!(
                user_id = %user_id,
                transaction_id = %transaction_id,
                error = %err,
                "dropped socket message"
            );
        }
    }
}
