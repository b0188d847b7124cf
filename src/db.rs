use sqlx::SqlitePool;

// Store layout.
//
// read_receipts — owned by this subsystem, upsert-only:
//     message_id TEXT, user_id TEXT, read_at TEXT (RFC 3339)
//     PRIMARY KEY (message_id, user_id)
//
// messages — pre-existing product table; this subsystem only reads the
// id -> chat_id mapping, which is immutable once a message is created.

/// Create the tables for local runs and tests. The product's migration
/// pipeline owns the real schema.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS read_receipts (\
            message_id TEXT NOT NULL,\
            user_id TEXT NOT NULL,\
            read_at TEXT NOT NULL,\
            PRIMARY KEY (message_id, user_id)\
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS messages (\
            id TEXT PRIMARY KEY,\
            chat_id TEXT NOT NULL,\
            content TEXT\
        )",
    )
    .execute(pool)
    .await?;

    Ok(())
}
