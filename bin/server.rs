// Follow Reconciler - Web Server
// REST API with Axum over the saved analysis

use anyhow::Context;
use axum::Router;
use follow_reconciler::api::{self, AppState};
use follow_reconciler::{Config, FollowSession, SqliteStore};
use tower_http::cors::CorsLayer;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .init();

    println!("🌐 Follow Reconciler - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let store = SqliteStore::open(&config.db_path)?;
    info!("database opened: {:?}", config.db_path);

    let state = AppState::new(FollowSession::open(store));

    // Build main router
    let app = Router::new()
        .nest("/api", api::router(state))
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.listen)
        .await
        .with_context(|| format!("Failed to bind to {}", config.listen))?;

    println!("\n🚀 Server running on http://{}", config.listen);
    println!("   API: http://{}/api/data", config.listen);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
