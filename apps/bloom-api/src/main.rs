//! # Bloom API Server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Bloom API Server                                │
//! │                                                                         │
//! │  Calendar UI ───► HTTP (8080) ───► Handlers ───► SQLite (bloom-db)      │
//! │       ▲                                              │                  │
//! │       └──────────── SSE ◄──── ChangeFeed ◄───────────┘                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use anyhow::Context;
use bloom_api::{router, ApiConfig, AppState};
use bloom_db::Database;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,bloom_api=debug")))
        .with_target(true)
        .init();

    info!("Starting Bloom API server...");

    // Load configuration
    let config = ApiConfig::load().context("loading configuration")?;
    info!(
        port = config.http_port,
        database = %config.database_path.display(),
        "Configuration loaded"
    );

    // Open the ledger store (runs migrations)
    let db = Database::new(config.db_config()).await.context("opening database")?;

    let addr = config.bind_address();
    let state = AppState::new(db.clone(), config);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "Listening");

    let shutdown_state = state.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            shutdown_state.begin_shutdown();
        })
        .await
        .context("serving HTTP")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
