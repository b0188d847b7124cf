use axum::{
    debug_handler,
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::chat::audit::SharedAudit;
use crate::chat::dispatch::Dispatcher;
use crate::chat::events::ClientEvent;
use crate::chat::rooms::{ChatRooms, ConnectionHandle};
use crate::{session, AppResult};

/// Upgrade an authenticated session into the bidirectional chat event
/// stream. The identity the auth layer attached to the session is read
/// once here and rides on the connection handle for its whole lifetime.
#[debug_handler(state = crate::AppState)]
pub async fn chat_ws(
    State(db_pool): State<SqlitePool>,
    State(rooms): State<ChatRooms>,
    State(audit): State<SharedAudit>,
    session: Session,

    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    let identity = session::identity(&session).await?;
    let dispatcher = Dispatcher::new(db_pool, rooms.clone(), audit.clone());

    Ok(ws.on_upgrade(move |stream| handle_socket(stream, dispatcher, rooms, audit, identity)))
}

async fn handle_socket(
    stream: WebSocket,
    dispatcher: Dispatcher,
    rooms: ChatRooms,
    audit: SharedAudit,
    identity: Option<session::Identity>,
) {
    let (conn, mut rx) = ConnectionHandle::new(identity);
    audit.connection_opened(conn.id, conn.user_id());

    let (mut sender, mut receiver) = stream.split();

    // Outbound pump: everything queued on the connection handle goes out
    // through this one task.
    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let Ok(text) = serde_json::to_string(&event) else {
                continue;
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    // Events from one connection are dispatched in arrival order; a frame
    // that does not decode to a known event is skipped.
    while let Some(Ok(msg)) = receiver.next().await {
        let Ok(event) = serde_json::from_slice::<ClientEvent>(&msg.into_data()) else {
            tracing::debug!(conn_id = %conn.id, "skipping undecodable frame");
            continue;
        };

        dispatcher.dispatch(&conn, event).await;
    }

    rooms.leave_all(conn.id);
    audit.connection_closed(conn.id);
    send_task.abort();
}
