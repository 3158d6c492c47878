//! Core domain logic for SlangSpot.
//! This crate is the single source of truth for business invariants:
//! ownership permissions, soft delete, list filtering and notification
//! fan-out.

pub mod db;
pub mod logging;
pub mod model;
pub mod permission;
pub mod repo;
pub mod search;
pub mod service;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, init_logging_with, logging_status, LogConfig};
pub use model::record::{now_epoch_ms, EntityKind, LikeOutcome, RecordId, RecordStatus, UserId};
pub use model::user::User;
pub use model::validation::FormErrors;
pub use repo::{RepoError, RepoResult};
pub use search::SearchParams;
pub use service::notification_service::{NoopPublisher, PublishError, Publisher};
pub use service::{RedirectTarget, Saved, ServiceError, ServiceResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
