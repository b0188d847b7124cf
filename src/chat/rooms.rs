use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::chat::events::ServerEvent;
use crate::session::Identity;

pub type ConnectionId = Uuid;

/// One live real-time session. Owned by the transport layer; the room map
/// only holds clones, which share the outbound channel.
#[derive(Clone)]
pub struct ConnectionHandle {
    pub id: ConnectionId,
    pub identity: Option<Identity>,
    tx: mpsc::UnboundedSender<ServerEvent>,
}

impl ConnectionHandle {
    /// Create a handle plus the receiving end the transport pumps to the
    /// socket.
    pub fn new(identity: Option<Identity>) -> (Self, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { id: Uuid::now_v7(), identity, tx }, rx)
    }

    /// Queue an event for this connection. Best-effort: a closed channel
    /// means the socket already went away.
    pub fn send(&self, event: ServerEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.user_id.as_str())
    }
}

/// Transport grouping key for a chat.
pub fn room_key(chat_id: &str) -> String {
    format!("chat_{chat_id}")
}

/// Chat id -> current member set. The one piece of shared mutable state in
/// the subsystem; the tokio runtime runs handlers in parallel, so every
/// access goes through the mutex.
#[derive(Clone, Default)]
pub struct ChatRooms {
    rooms: Arc<Mutex<HashMap<String, HashMap<ConnectionId, ConnectionHandle>>>>,
}

impl ChatRooms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to a room. Joining a room twice is a no-op
    /// state-wise; the room is created on first join.
    pub fn join(&self, conn: &ConnectionHandle, chat_id: &str) {
        let mut rooms = self.rooms.lock().expect("room map poisoned");
        rooms
            .entry(room_key(chat_id))
            .or_default()
            .insert(conn.id, conn.clone());
    }

    /// Remove a connection from a room. Rooms are garbage-free: an emptied
    /// member set drops the room entry.
    pub fn leave(&self, conn_id: ConnectionId, chat_id: &str) {
        let mut rooms = self.rooms.lock().expect("room map poisoned");
        let key = room_key(chat_id);
        if let Some(members) = rooms.get_mut(&key) {
            members.remove(&conn_id);
            if members.is_empty() {
                rooms.remove(&key);
            }
        }
    }

    /// Transport-disconnect cleanup: silently drop the connection from every
    /// room it still belongs to.
    pub fn leave_all(&self, conn_id: ConnectionId) {
        let mut rooms = self.rooms.lock().expect("room map poisoned");
        rooms.retain(|_, members| {
            members.remove(&conn_id);
            !members.is_empty()
        });
    }

    /// Fan an event out to every member of a room, optionally excluding one
    /// connection. Returns how many members it was queued for.
    pub fn broadcast(
        &self,
        chat_id: &str,
        event: &ServerEvent,
        exclude: Option<ConnectionId>,
    ) -> usize {
        let recipients: Vec<ConnectionHandle> = {
            let rooms = self.rooms.lock().expect("room map poisoned");
            match rooms.get(&room_key(chat_id)) {
                Some(members) => members
                    .values()
                    .filter(|c| Some(c.id) != exclude)
                    .cloned()
                    .collect(),
                None => return 0,
            }
        };

        let mut sent = 0;
        for conn in &recipients {
            if conn.send(event.clone()) {
                sent += 1;
            }
        }
        sent
    }

    /// Current member ids of a room.
    pub fn members(&self, chat_id: &str) -> Vec<ConnectionId> {
        let rooms = self.rooms.lock().expect("room map poisoned");
        rooms
            .get(&room_key(chat_id))
            .map(|members| members.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.lock().expect("room map poisoned").len()
    }
}
