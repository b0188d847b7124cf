use sqlx::SqlitePool;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::time::{timeout, Duration};

use crate::chat::dispatch::ChatError;
use crate::chat::events::ServerEvent;
use crate::chat::rooms::{ChatRooms, ConnectionHandle};

/// Bound on each store round trip; an elapsed timeout counts as a store
/// failure.
pub const STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Persist a read event for (message, user) and notify the owning room.
///
/// The upsert is last-write-wins on the (message_id, user_id) key: a
/// reread by the same user refreshes the timestamp instead of adding a row.
/// A message with no owning chat is a quiet no-op after the upsert — the
/// receipt is kept, nothing is broadcast, and no error is raised.
pub async fn mark_read(
    pool: &SqlitePool,
    rooms: &ChatRooms,
    conn: &ConnectionHandle,
    message_id: Option<&str>,
) -> Result<(), ChatError> {
    let message_id = message_id
        .filter(|m| !m.is_empty())
        .ok_or(ChatError::MissingField("messageId"))?;
    let identity = conn.identity.as_ref().ok_or(ChatError::Unauthenticated)?;

    let read_at = OffsetDateTime::now_utc().format(&Rfc3339)?;

    timeout(
        STORE_TIMEOUT,
        sqlx::query(
            "INSERT INTO read_receipts (message_id,user_id,read_at) VALUES (?,?,?) \
             ON CONFLICT(message_id,user_id) DO UPDATE SET read_at=excluded.read_at",
        )
        .bind(message_id)
        .bind(&identity.user_id)
        .bind(&read_at)
        .execute(pool),
    )
    .await
    .map_err(|_| ChatError::StoreTimeout)??;

    let row: Option<(String,)> = timeout(
        STORE_TIMEOUT,
        sqlx::query_as("SELECT chat_id FROM messages WHERE id=?")
            .bind(message_id)
            .fetch_optional(pool),
    )
    .await
    .map_err(|_| ChatError::StoreTimeout)??;

    let Some((chat_id,)) = row else {
        return Ok(());
    };

    rooms.broadcast(
        &chat_id,
        &ServerEvent::MessageRead {
            message_id: message_id.to_owned(),
            read_by: identity.user_id.clone(),
            read_by_name: identity.display_name().to_owned(),
            read_at,
        },
        None,
    );

    Ok(())
}
