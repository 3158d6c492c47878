use crate::config::ServerConfig;
use crate::error::AppError;
use crate::live::BroadcastHub;
use rusqlite::Connection;
use slangspot_core::{open_db, Publisher};
use std::sync::Arc;

/// Shared handler state. The database is opened per request, so only the
/// configuration and the live hub are shared.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub hub: Arc<BroadcastHub>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
            hub: Arc::new(BroadcastHub::new()),
        }
    }

    /// Runs `job` on the blocking pool with a freshly opened connection and
    /// the live hub as notification publisher.
    pub async fn with_db<T, F>(&self, job: F) -> Result<T, AppError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection, &dyn Publisher) -> Result<T, AppError> + Send + 'static,
    {
        let database_path = self.config.database_path.clone();
        let hub = Arc::clone(&self.hub);
        tokio::task::spawn_blocking(move || {
            let conn = open_db(&database_path)?;
            job(&conn, hub.as_ref())
        })
        .await?
    }
}
