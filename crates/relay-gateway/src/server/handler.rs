//! WebSocket handler
//!
//! Validates any credential offered with the upgrade request, then runs the
//! connection: a writer task drains the outbound queue while this task reads
//! and handles frames in order.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use relay_common::{AppError, CredentialError, ErrorResponse};
use relay_core::Principal;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::{timeout, timeout_at, Instant};

use crate::connection::{Connection, Outbound};
use crate::handlers::{AuthenticateHandler, FrameDispatcher, HandlerError};
use crate::protocol::{CloseCode, FrameError};
use crate::server::GatewayState;

/// How long the writer may take to flush after the reader stops
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Query parameters accepted on the upgrade request
#[derive(Debug, Default, Deserialize)]
pub struct GatewayQuery {
    pub token: Option<String>,
}

/// WebSocket gateway handler
pub async fn gateway_handler(
    State(state): State<GatewayState>,
    Query(query): Query<GatewayQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let token = query.token.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    });

    let principal = match token {
        Some(token) => match state.validator().validate(&token) {
            Ok(principal) => Some(principal),
            Err(e) => {
                tracing::debug!(error = %e, "Upgrade refused");
                return unauthorized(e);
            }
        },
        None => None,
    };

    ws.on_upgrade(move |socket| handle_socket(state, socket, principal))
}

fn unauthorized(err: CredentialError) -> Response {
    let body = ErrorResponse::from(AppError::Credential(err));
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": body }))).into_response()
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(state: GatewayState, socket: WebSocket, principal: Option<Principal>) {
    let session_id = uuid::Uuid::new_v4().to_string();
    let (tx, rx) = mpsc::channel::<Outbound>(state.config().outbound_buffer.max(1));
    let connection = state.registry().add_connection(session_id.clone(), tx);

    tracing::info!(session_id = %session_id, "WebSocket connection established");

    let (ws_sink, ws_stream) = socket.split();
    let mut send_task = tokio::spawn(write_loop(session_id.clone(), ws_sink, rx));

    if let Some(principal) = principal {
        AuthenticateHandler::complete(&state, &connection, &principal).await;
    }

    let close_code = read_loop(&state, &connection, ws_stream).await;

    // Queue the close frame, then drop every sender so the writer finishes
    connection.close(close_code.unwrap_or(CloseCode::Normal));
    state.registry().remove_connection(&session_id);
    drop(connection);

    if timeout(WRITER_DRAIN_TIMEOUT, &mut send_task).await.is_err() {
        tracing::warn!(session_id = %session_id, "Writer did not finish; aborting");
        send_task.abort();
    }

    tracing::info!(
        session_id = %session_id,
        close_code = ?close_code,
        "WebSocket connection closed"
    );
}

/// Read frames until the client leaves or a close code is chosen
async fn read_loop(
    state: &GatewayState,
    connection: &Arc<Connection>,
    mut stream: SplitStream<WebSocket>,
) -> Option<CloseCode> {
    let handshake_deadline = Instant::now() + state.config().handshake_timeout();

    loop {
        let next = if connection.is_authenticated() {
            match timeout(state.config().idle_timeout(), stream.next()).await {
                Ok(next) => next,
                Err(_) => {
                    tracing::info!(session_id = %connection.session_id(), "Idle timeout");
                    return Some(CloseCode::SessionTimeout);
                }
            }
        } else {
            match timeout_at(handshake_deadline, stream.next()).await {
                Ok(next) => next,
                Err(_) => {
                    tracing::debug!(
                        session_id = %connection.session_id(),
                        "No credential within the handshake window"
                    );
                    let err = HandlerError::NotAuthenticated;
                    connection.send(err.to_event(None)).await.ok();
                    return err.to_close_code();
                }
            }
        };

        match next {
            Some(Ok(Message::Text(text))) => {
                if let Some(code) = FrameDispatcher::handle_text(state, connection, &text).await {
                    return Some(code);
                }
            }
            Some(Ok(Message::Binary(_))) => {
                let err = HandlerError::from(FrameError::Malformed(
                    "binary frames are not supported".to_string(),
                ));
                connection.send(err.to_event(None)).await.ok();
            }
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                // Pong is handled automatically by axum
            }
            Some(Ok(Message::Close(_))) | None => {
                tracing::debug!(session_id = %connection.session_id(), "Client closed connection");
                return None;
            }
            Some(Err(e)) => {
                tracing::debug!(
                    session_id = %connection.session_id(),
                    error = %e,
                    "WebSocket error"
                );
                return None;
            }
        }
    }
}

/// Write queued frames to the socket in order
async fn write_loop(
    session_id: String,
    mut sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<Outbound>,
) {
    while let Some(item) = rx.recv().await {
        match item {
            Outbound::Event(event) => {
                let json = match event.to_json() {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::warn!(session_id = %session_id, error = %e, "Unserializable event");
                        continue;
                    }
                };
                if sink.send(Message::Text(json)).await.is_err() {
                    tracing::debug!(session_id = %session_id, "Socket write failed");
                    return;
                }
            }
            Outbound::Close(code) => {
                let frame = CloseFrame {
                    code: code.as_u16(),
                    reason: Cow::Borrowed(code.description()),
                };
                sink.send(Message::Close(Some(frame))).await.ok();
                return;
            }
        }
    }

    sink.close().await.ok();
}
