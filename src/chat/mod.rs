pub mod audit;
pub mod dispatch;
pub mod events;
pub mod receipts;
pub mod rooms;
pub mod typing;
mod ws;

use axum::{routing::get, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(ws::chat_ws))
}
