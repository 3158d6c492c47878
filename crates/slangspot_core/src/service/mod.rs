//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into request-level use-cases:
//!   fetch, permission check, validation, persistence, redirect target.
//! - Keep the HTTP layer decoupled from storage details.

pub mod blog_service;
pub mod error;
pub mod forum_service;
pub mod lesson_service;
pub mod notification_service;
pub mod outcome;
pub mod practice_service;
pub mod profile_service;
pub mod user_service;

pub use error::{ServiceError, ServiceResult};
pub use outcome::{RedirectTarget, Saved};

use crate::model::record::{EntityKind, RecordId};
use crate::model::slug::unique_slug;
use crate::repo::RepoResult;
use log::info;

/// Picks the first free slug derived from `base`, propagating lookup errors.
pub(crate) fn free_slug(
    base: &str,
    fallback: &str,
    exists: impl Fn(&str) -> RepoResult<bool>,
) -> ServiceResult<String> {
    let mut lookup_error = None;
    let slug = unique_slug(base, fallback, |candidate| {
        if lookup_error.is_some() {
            return false;
        }
        match exists(candidate) {
            Ok(taken) => taken,
            Err(err) => {
                lookup_error = Some(err);
                false
            }
        }
    });
    match lookup_error {
        Some(err) => Err(err.into()),
        None => Ok(slug),
    }
}

pub(crate) fn log_soft_delete(kind: EntityKind, id: RecordId) {
    info!(
        "event=soft_delete module=service status=ok entity={} id={}",
        kind.label().replace(' ', "_"),
        id
    );
}
