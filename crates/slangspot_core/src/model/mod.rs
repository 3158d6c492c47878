//! Domain model for lessons, forum, blog, practices, profiles and
//! notifications.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Turn raw form input into validated field sets.
//!
//! # Invariants
//! - Every content record carries a [`record::RecordMeta`] with a stable id.
//! - Deletion is represented by a soft-delete status, never a hard delete.
//! - Ownership is `author_id` for authored content and `user_id` for
//!   per-user records.

pub mod blog;
pub mod forum;
pub mod lesson;
pub mod notification;
pub mod practice;
pub mod profile;
pub mod record;
pub mod slug;
pub mod user;
pub mod validation;
