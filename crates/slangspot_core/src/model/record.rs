//! Common record base shared by every soft-deletable entity.
//!
//! # Invariants
//! - `status == Deleted` implies `deleted_at.is_some()`.
//! - Soft delete is idempotent: the first deletion timestamp is kept.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier of a persisted record.
pub type RecordId = Uuid;

/// Stable identifier of a user account.
pub type UserId = Uuid;

/// Lifecycle state of a record.
///
/// Stored as text so further states can be added without a schema rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// Visible and editable.
    Active,
    /// Soft-deleted tombstone; kept for history.
    Deleted,
}

impl RecordStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Deleted => "deleted",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "deleted" => Some(Self::Deleted),
            _ => None,
        }
    }
}

/// Identifier, timestamps and lifecycle state shared by all entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    pub id: RecordId,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
    pub status: RecordStatus,
    /// Unix epoch milliseconds; set once when the record is soft-deleted.
    pub deleted_at: Option<i64>,
}

impl RecordMeta {
    /// Creates metadata for a new active record with a generated id.
    pub fn new() -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            status: RecordStatus::Active,
            deleted_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == RecordStatus::Active
    }

    /// Marks the record as deleted at `at`.
    pub fn soft_delete(&mut self, at: i64) {
        if self.status == RecordStatus::Deleted {
            return;
        }
        self.status = RecordStatus::Deleted;
        self.deleted_at = Some(at);
        self.updated_at = at;
    }

    pub fn touch(&mut self) {
        self.updated_at = now_epoch_ms();
    }
}

impl Default for RecordMeta {
    fn default() -> Self {
        Self::new()
    }
}

/// Entity families, used for permission messages and not-found reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Lesson,
    Expression,
    ForumPost,
    Comment,
    Category,
    BlogPost,
    Practice,
    Profile,
    Notification,
    User,
}

impl EntityKind {
    /// User-facing noun.
    pub fn label(self) -> &'static str {
        match self {
            Self::Lesson => "lesson",
            Self::Expression => "expression",
            Self::ForumPost => "post",
            Self::Comment => "comment",
            Self::Category => "category",
            Self::BlogPost => "blog post",
            Self::Practice => "practice",
            Self::Profile => "profile",
            Self::Notification => "notification",
            Self::User => "user",
        }
    }
}

/// Result of a like toggle, serialized as the like action response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeOutcome {
    /// Whether the actor likes the target after the toggle.
    pub liked: bool,
    /// Size of the liker set after the toggle.
    pub likes_count: u32,
}

/// Current time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{RecordMeta, RecordStatus};

    #[test]
    fn new_meta_is_active_without_deletion_time() {
        let meta = RecordMeta::new();
        assert!(meta.is_active());
        assert_eq!(meta.deleted_at, None);
        assert_eq!(meta.created_at, meta.updated_at);
    }

    #[test]
    fn soft_delete_keeps_first_timestamp() {
        let mut meta = RecordMeta::new();
        meta.soft_delete(1_000);
        meta.soft_delete(2_000);
        assert_eq!(meta.status, RecordStatus::Deleted);
        assert_eq!(meta.deleted_at, Some(1_000));
    }

    #[test]
    fn status_parses_only_known_values() {
        assert_eq!(RecordStatus::parse("active"), Some(RecordStatus::Active));
        assert_eq!(RecordStatus::parse("deleted"), Some(RecordStatus::Deleted));
        assert_eq!(RecordStatus::parse("archived"), None);
    }
}
