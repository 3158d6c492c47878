//! Notification records and the live event pushed to recipients.
//!
//! # Invariants
//! - A notification belongs to exactly one recipient (`user_id`).
//! - `is_read` only ever moves from `false` to `true`.

use crate::model::record::{now_epoch_ms, RecordId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    PostLike,
    CommentLike,
    NewComment,
    Reply,
    Mention,
    Moderation,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PostLike => "post_like",
            Self::CommentLike => "comment_like",
            Self::NewComment => "new_comment",
            Self::Reply => "reply",
            Self::Mention => "mention",
            Self::Moderation => "moderation",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "post_like" => Some(Self::PostLike),
            "comment_like" => Some(Self::CommentLike),
            "new_comment" => Some(Self::NewComment),
            "reply" => Some(Self::Reply),
            "mention" => Some(Self::Mention),
            "moderation" => Some(Self::Moderation),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: RecordId,
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub message: String,
    pub related_post_id: Option<RecordId>,
    pub related_comment_id: Option<RecordId>,
    pub related_user_id: Option<UserId>,
    pub is_read: bool,
    pub created_at: i64,
}

impl Notification {
    pub fn new(user_id: UserId, kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            message: message.into(),
            related_post_id: None,
            related_comment_id: None,
            related_user_id: None,
            is_read: false,
            created_at: now_epoch_ms(),
        }
    }

    pub fn with_post(mut self, post_id: RecordId) -> Self {
        self.related_post_id = Some(post_id);
        self
    }

    pub fn with_comment(mut self, comment_id: RecordId) -> Self {
        self.related_comment_id = Some(comment_id);
        self
    }

    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.related_user_id = Some(user_id);
        self
    }
}

/// Payload pushed to a recipient's live channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub recipient: UserId,
    pub notification_id: RecordId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    pub post_id: Option<RecordId>,
    pub comment_id: Option<RecordId>,
    pub created_at: i64,
}

impl From<&Notification> for NotificationEvent {
    fn from(value: &Notification) -> Self {
        Self {
            recipient: value.user_id,
            notification_id: value.id,
            kind: value.kind,
            message: value.message.clone(),
            post_id: value.related_post_id,
            comment_id: value.related_comment_id,
            created_at: value.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Notification, NotificationEvent, NotificationKind};
    use uuid::Uuid;

    #[test]
    fn kind_round_trips_through_storage_text() {
        for kind in [
            NotificationKind::PostLike,
            NotificationKind::CommentLike,
            NotificationKind::NewComment,
            NotificationKind::Reply,
            NotificationKind::Mention,
            NotificationKind::Moderation,
        ] {
            assert_eq!(NotificationKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn event_carries_related_refs() {
        let post_id = Uuid::new_v4();
        let notification =
            Notification::new(Uuid::new_v4(), NotificationKind::PostLike, "liked").with_post(post_id);
        let event = NotificationEvent::from(&notification);
        assert_eq!(event.recipient, notification.user_id);
        assert_eq!(event.post_id, Some(post_id));
        assert!(!notification.is_read);
    }
}
