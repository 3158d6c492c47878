//! HTTP surface for SlangSpot.
//!
//! # Responsibility
//! - Serve lessons, forum, blog, practice, profile and notification pages
//!   over axum.
//! - Push new notifications to connected recipients over WebSocket.
//!
//! # Invariants
//! - Storage work never runs on async worker threads.
//! - Handlers hold no state besides [`AppState`].

pub mod auth;
pub mod config;
pub mod error;
pub mod live;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::{ConfigError, RedirectConfig, ServerConfig};
pub use error::AppError;
pub use live::BroadcastHub;
pub use routes::build_router;
pub use state::AppState;

use log::info;
use slangspot_core::{open_db, DbError};
use thiserror::Error;
use tokio::net::TcpListener;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database setup failed: {0}")]
    Db(#[from] DbError),
    #[error("failed to bind {bind}: {source}")]
    Bind {
        bind: String,
        #[source]
        source: std::io::Error,
    },
    #[error("server stopped: {0}")]
    Serve(#[source] std::io::Error),
}

/// Migrates the database, binds `config.bind` and serves until shutdown.
pub async fn serve(config: ServerConfig) -> Result<(), ServerError> {
    config.validate()?;
    // Apply migrations once up front so request connections start current.
    drop(open_db(&config.database_path)?);

    let bind = config.bind.clone();
    let listener = TcpListener::bind(&bind)
        .await
        .map_err(|source| ServerError::Bind {
            bind: bind.clone(),
            source,
        })?;
    info!(
        "event=server_start module=http status=ok bind={} database={}",
        bind,
        config.database_path.display()
    );

    let router = build_router(AppState::new(config));
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)?;
    info!("event=server_stop module=http status=ok");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
