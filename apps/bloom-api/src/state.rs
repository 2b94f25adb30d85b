//! Shared application state.

use std::sync::Arc;

use bloom_db::Database;
use tokio::sync::watch;
use tracing::info;

use crate::config::ApiConfig;

/// State handed to every handler. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Ledger Store handle (pool + change feed).
    pub db: Database,

    pub config: Arc<ApiConfig>,

    /// Flips to `true` once shutdown starts; open SSE streams end on it.
    shutdown: Arc<watch::Sender<bool>>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        AppState {
            db,
            config: Arc::new(config),
            shutdown: Arc::new(shutdown),
        }
    }

    /// Receiver that observes [`AppState::begin_shutdown`].
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Ends long-lived streams so graceful shutdown can drain connections.
    pub fn begin_shutdown(&self) {
        info!("Closing live streams");
        self.shutdown.send_replace(true);
    }
}
