use anyhow::{Context, Result};
use tracing::info;

use snip::app::create_app;
use snip::config::{Config, DatabaseBackend};
use snip::logging::init_logging;
use snip::storage;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing; the guard flushes the log writer on exit
    let _log_guard = init_logging(&config.logging)?;
    info!("Loaded configuration");

    match config.database.backend {
        DatabaseBackend::Sqlite => info!("Using SQLite storage"),
        DatabaseBackend::Postgres => info!("Using PostgreSQL storage"),
    }
    info!(
        max_connections = config.database.max_connections,
        acquire_timeout_ms = config.database.acquire_timeout_ms,
        "Initializing database..."
    );
    let store = storage::connect(&config.database).await?;
    info!("Database initialized successfully");

    let app = create_app(store, &config);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("🚀 Listening on http://{}", addr);
    info!("   - Short links served under {}/", config.public.base_url);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
