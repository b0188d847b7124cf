use sqlx::SqlitePool;

use crate::chat::audit::SharedAudit;
use crate::chat::events::{ClientEvent, ServerEvent};
use crate::chat::receipts;
use crate::chat::rooms::{ChatRooms, ConnectionHandle};
use crate::chat::typing;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("authentication required")]
    Unauthenticated,

    #[error("store operation failed: {0}")]
    Store(#[from] sqlx::Error),

    #[error("store operation timed out")]
    StoreTimeout,

    #[error("timestamp formatting failed: {0}")]
    Timestamp(#[from] time::error::Format),
}

impl ChatError {
    /// Rejected before any state change, as opposed to a failure of the
    /// operation itself.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::MissingField(_) | Self::Unauthenticated)
    }
}

/// Routes each inbound event to its handler and keeps every failure
/// contained to the originating connection: at most one `error` event goes
/// back to the caller, and nothing propagates to other connections or
/// terminates the socket.
pub struct Dispatcher {
    pool: SqlitePool,
    rooms: ChatRooms,
    audit: SharedAudit,
}

impl Dispatcher {
    pub fn new(pool: SqlitePool, rooms: ChatRooms, audit: SharedAudit) -> Self {
        Self { pool, rooms, audit }
    }

    pub fn rooms(&self) -> &ChatRooms {
        &self.rooms
    }

    pub async fn dispatch(&self, conn: &ConnectionHandle, event: ClientEvent) {
        match event {
            ClientEvent::Join { chat_id } => self.join(conn, chat_id.as_deref()),
            ClientEvent::Leave { chat_id } => self.leave(conn, chat_id.as_deref()),
            ClientEvent::Typing { chat_id, is_typing } => {
                self.typing(conn, chat_id.as_deref(), is_typing)
            }
            ClientEvent::MarkRead { message_id } => {
                self.mark_read(conn, message_id.as_deref()).await
            }
        }
    }

    fn join(&self, conn: &ConnectionHandle, chat_id: Option<&str>) {
        let Some(chat_id) = chat_id.filter(|c| !c.is_empty()) else {
            self.reject(conn, ChatError::MissingField("chatId"));
            return;
        };

        self.rooms.join(conn, chat_id);
        self.audit.member_joined(chat_id, conn.id, conn.user_id());

        conn.send(ServerEvent::Joined {
            success: true,
            chat_id: chat_id.to_owned(),
            message: "Successfully joined chat".to_owned(),
        });
        self.rooms.broadcast(
            chat_id,
            &ServerEvent::UserJoined {
                user_id: conn.user_id().map(str::to_owned),
                user_name: display_name(conn),
                chat_id: chat_id.to_owned(),
            },
            Some(conn.id),
        );
    }

    fn leave(&self, conn: &ConnectionHandle, chat_id: Option<&str>) {
        let Some(chat_id) = chat_id.filter(|c| !c.is_empty()) else {
            self.reject(conn, ChatError::MissingField("chatId"));
            return;
        };

        self.rooms.leave(conn.id, chat_id);
        self.audit.member_left(chat_id, conn.id, conn.user_id());

        conn.send(ServerEvent::Left {
            success: true,
            chat_id: chat_id.to_owned(),
            message: "Successfully left chat".to_owned(),
        });
        self.rooms.broadcast(
            chat_id,
            &ServerEvent::UserLeft {
                user_id: conn.user_id().map(str::to_owned),
                user_name: display_name(conn),
                chat_id: chat_id.to_owned(),
            },
            Some(conn.id),
        );
    }

    fn typing(&self, conn: &ConnectionHandle, chat_id: Option<&str>, is_typing: bool) {
        match typing::set_typing(&self.rooms, conn, chat_id, is_typing) {
            Ok(_) => {}
            Err(e) if e.is_validation() => self.reject(conn, e),
            // A missed typing indicator is not user-visible-critical;
            // anything past validation is logged and dropped.
            Err(e) => self.audit.signal_dropped(conn.id, "typing", &e.to_string()),
        }
    }

    async fn mark_read(&self, conn: &ConnectionHandle, message_id: Option<&str>) {
        match receipts::mark_read(&self.pool, &self.rooms, conn, message_id).await {
            Ok(()) => {}
            Err(e) if e.is_validation() => self.reject(conn, e),
            Err(e) => {
                self.audit.store_failure(conn.id, "mark_read", &e.to_string());
                conn.send(ServerEvent::error("Failed to mark message as read"));
            }
        }
    }

    fn reject(&self, conn: &ConnectionHandle, err: ChatError) {
        self.audit.request_rejected(conn.id, &err.to_string());
        conn.send(ServerEvent::error(err.to_string()));
    }
}

fn display_name(conn: &ConnectionHandle) -> String {
    conn.identity
        .as_ref()
        .map(|i| i.display_name().to_owned())
        .unwrap_or_else(|| crate::session::UNKNOWN_USER.to_owned())
}
