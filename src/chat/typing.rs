use crate::chat::dispatch::ChatError;
use crate::chat::events::ServerEvent;
use crate::chat::rooms::{ChatRooms, ConnectionHandle};

/// Relay a typing signal to the rest of the room. Stateless: nothing is
/// retained, there is no server-side typing timeout, and the sender gets no
/// ack. Returns how many members the signal was queued for.
pub fn set_typing(
    rooms: &ChatRooms,
    conn: &ConnectionHandle,
    chat_id: Option<&str>,
    is_typing: bool,
) -> Result<usize, ChatError> {
    let chat_id = chat_id
        .filter(|c| !c.is_empty())
        .ok_or(ChatError::MissingField("chatId"))?;
    let identity = conn.identity.as_ref().ok_or(ChatError::Unauthenticated)?;

    let event = ServerEvent::Typing {
        chat_id: chat_id.to_owned(),
        sender_id: identity.user_id.clone(),
        sender_name: identity.display_name().to_owned(),
        is_typing,
    };

    Ok(rooms.broadcast(chat_id, &event, Some(conn.id)))
}
