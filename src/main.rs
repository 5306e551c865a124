use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tienda_bot_api::{app::app, config::AppConfig, database::DatabaseManager, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, MIGRATION_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tienda_bot_api=debug,tower_http=debug")),
        )
        .init();

    let config = AppConfig::from_env();
    info!("Starting Tienda Bot API in {:?} mode", config.environment);
    if config.security.migration_secret.is_empty() {
        info!("MIGRATION_SECRET is not set; /admin routes will reject every request");
    }

    let pool = DatabaseManager::connect(&config.database).context("invalid database configuration")?;
    let bind_addr = config.bind_addr();
    let state = AppState::new(pool, config);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Tienda Bot API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
}
