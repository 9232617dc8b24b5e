use std::sync::Arc;
use axum::{
    extract::{Path, Query, State, ws::{Message, WebSocket, WebSocketUpgrade}},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use utoipa::IntoParams;

use crate::{handlers::require_field, AppState};
use crate::models::{ClientEvent, ErrorResponse, OutboundMessage, ServerEvent};
use crate::ws::hub::JoinPolicy;
use crate::ws::router::EventOutcome;

/// Query of both socket routes
#[derive(Deserialize, Debug, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct JoinQuery {
    pub user_id: String,
}

/// WebSocket for a document session created through the REST api
pub async fn document_socket(
    Path(session_id): Path<String>,
    Query(query): Query<JoinQuery>,
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    info!(session_id = %session_id, user_id = %query.user_id, "new document socket");
    if let Err(e) = require_field("userId", &query.user_id) {
        return <(StatusCode, Json<ErrorResponse>)>::from(e).into_response();
    }
    ws.on_upgrade(move |socket| handle_socket(socket, session_id, query.user_id, JoinPolicy::Existing, app_state))
}

/// WebSocket for an ephemeral room, created on first join
pub async fn room_socket(
    Path(room_id): Path<String>,
    Query(query): Query<JoinQuery>,
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    info!(room_id = %room_id, user_id = %query.user_id, "new room socket");
    if let Err(e) = require_field("userId", &query.user_id) {
        return <(StatusCode, Json<ErrorResponse>)>::from(e).into_response();
    }
    ws.on_upgrade(move |socket| handle_socket(socket, room_id, query.user_id, JoinPolicy::CreateRoom, app_state))
}

async fn handle_socket(
    socket: WebSocket,
    session_id: String,
    user_id: String,
    policy: JoinPolicy,
    app_state: Arc<AppState>,
) {
    let (mut sink, mut stream) = socket.split();

    // The registry owns the only strong sender, so evicting the connection ends the writer.
    let (tx, mut rx) = mpsc::channel::<OutboundMessage>(app_state.config.outbound_queue_size.max(1));
    let replies = tx.downgrade();

    let registry = app_state.registry.clone();
    let conn_id = match registry.join(&session_id, &user_id, tx, policy).await {
        Ok(joined) => joined.conn_id,
        Err(e) => {
            warn!(session_id = %session_id, user_id = %user_id, "join rejected: {}", e);
            if let Ok(text) = OutboundMessage::system(ServerEvent::from(&e)).to_text() {
                let _ = sink.send(Message::Text(text)).await;
            }
            let _ = sink.send(Message::Close(None)).await;
            return;
        }
    };

    // Drain the outbound queue into the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let text = match msg.to_text() {
                Ok(text) => text,
                Err(e) => {
                    error!(conn_id, "dropping outbound message: {}", e);
                    continue;
                }
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
        let _ = sink.send(Message::Close(None)).await;
    });

    // Read client events; only text frames carry events
    let reader_registry = registry.clone();
    let reader_session = session_id.clone();
    let reader_user = user_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(frame) = stream.next().await {
            let text = match frame {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) => break,
                Ok(_) => continue,
                Err(e) => {
                    debug!(conn_id, "socket read failed: {}", e);
                    break;
                }
            };

            let reply = match ClientEvent::parse(&text) {
                Ok(event) => match reader_registry
                    .apply_connection_event(&reader_session, conn_id, &reader_user, event)
                    .await
                {
                    Ok(EventOutcome::Pong(pong)) => Some(ServerEvent::Pong(pong)),
                    Ok(_) => None,
                    Err(e) => Some(ServerEvent::from(&e)),
                },
                Err(e) => {
                    warn!(session_id = %reader_session, user_id = %reader_user, "{}", e);
                    Some(ServerEvent::from(&e))
                }
            };

            if let Some(event) = reply {
                let Some(tx) = replies.upgrade() else {
                    break;
                };
                if tx.try_send(OutboundMessage::system(event)).is_err() {
                    debug!(conn_id, "reply dropped, outbound queue unavailable");
                }
            }
        }
    });

    // Wait for either task to finish (and finish the other)
    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    registry.leave_connection(&session_id, conn_id).await;
    info!(session_id = %session_id, user_id = %user_id, conn_id, "WebSocket connection terminated");
}
