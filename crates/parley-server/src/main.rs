use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use parley_api::middleware::require_auth;
use parley_api::state::{AppState, AppStateInner};
use parley_api::{conversations, messages, notifications, prefs};
use parley_notify::{Dispatcher, EmailTransport, HttpMailer, NoopMailer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parley=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let db_path = std::env::var("PARLEY_DB_PATH").unwrap_or_else(|_| "parley.db".into());
    let host = std::env::var("PARLEY_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("PARLEY_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database
    let db = Arc::new(parley_db::Database::open(&PathBuf::from(&db_path))?);

    // Outbound mail: HTTP relay when configured, otherwise drop with a log
    let transport: Arc<dyn EmailTransport> = match std::env::var("PARLEY_MAIL_RELAY_URL") {
        Ok(relay_url) => {
            let from = std::env::var("PARLEY_MAIL_FROM")
                .unwrap_or_else(|_| "no-reply@parley.local".into());
            info!("Outbound mail via relay at {}", relay_url);
            Arc::new(HttpMailer::new(relay_url, from))
        }
        Err(_) => Arc::new(NoopMailer),
    };

    let dispatcher = Dispatcher::new(db.clone(), transport);
    let state: AppState = Arc::new(AppStateInner { db, dispatcher });

    // Routes — every operation needs a verified identity
    let app = Router::new()
        .route("/conversations", get(conversations::list_conversations))
        .route(
            "/conversations/{conversation_id}/messages",
            get(messages::get_messages),
        )
        .route(
            "/conversations/{conversation_id}/read",
            post(messages::mark_read),
        )
        .route("/messages", post(messages::send_message))
        .route("/messages/unread-count", get(messages::unread_count))
        .route("/notifications", get(notifications::list_notifications))
        .route(
            "/notifications/unread-count",
            get(notifications::unread_count),
        )
        .route(
            "/notifications/{notification_id}/read",
            post(notifications::mark_read),
        )
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .route(
            "/notification-prefs",
            get(prefs::get_prefs).put(prefs::update_prefs),
        )
        .layer(middleware::from_fn(require_auth))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Parley server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
