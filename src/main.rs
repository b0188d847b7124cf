use std::sync::Arc;

use axum::{routing::get, Router};
use huddle::chat::audit::TracingAudit;
use huddle::chat::rooms::ChatRooms;
use huddle::{chat, db, AppState};
use sqlx::sqlite::SqlitePoolOptions;
use tower_http::cors::CorsLayer;
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(30)));

    let db_pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect(&dotenv::var("DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_owned()))
        .await?;
    db::ensure_schema(&db_pool).await?;

    let app_state = AppState {
        db_pool,
        rooms: ChatRooms::new(),
        audit: Arc::new(TracingAudit),
    };

    let app = Router::new()
        .route("/", get(health))
        .nest("/chat", chat::router())
        .with_state(app_state)
        .layer(session_layer)
        .layer(CorsLayer::permissive());

    let addr = dotenv::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_owned());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "chat core listening");
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> &'static str {
    "ok"
}
