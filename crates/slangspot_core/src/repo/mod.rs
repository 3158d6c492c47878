//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts, one trait per entity
//!   family.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repositories never hard-delete content rows; deletion is a status
//!   update.
//! - Repository APIs return semantic errors (`NotFound`, `Conflict`) in
//!   addition to DB transport errors.

pub mod blog_repo;
pub mod common;
pub mod forum_repo;
pub mod lesson_repo;
pub mod notification_repo;
pub mod practice_repo;
pub mod profile_repo;
pub mod user_repo;

pub use common::{normalize_limit, RepoError, RepoResult};
