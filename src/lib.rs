pub mod apperr;
pub mod chat;
pub mod db;
pub mod session;

use axum::extract::FromRef;
use sqlx::SqlitePool;

pub use apperr::{AppError, AppResult};

use chat::audit::SharedAudit;
use chat::rooms::ChatRooms;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub rooms: ChatRooms,
    pub audit: SharedAudit,
}
