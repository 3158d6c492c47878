//! Notification fan-out and inbox use-cases.
//!
//! # Responsibility
//! - Create notification records for likes, comments, replies, mentions and
//!   moderation actions.
//! - Push each new notification to the recipient's live channel through an
//!   abstract [`Publisher`].
//! - Serve the unread inbox and read-state updates.
//!
//! # Invariants
//! - An actor never notifies themself.
//! - Publishing is best-effort: a failed or undelivered push is logged and
//!   never fails the triggering request. A storage failure does.

use crate::model::forum::{Comment, ForumPost, ModerationAction};
use crate::model::notification::{Notification, NotificationEvent, NotificationKind};
use crate::model::record::{EntityKind, RecordId};
use crate::model::user::User;
use crate::repo::notification_repo::NotificationRepository;
use crate::service::error::{ServiceError, ServiceResult};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

static MENTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\s)@([\w.+-]+)").expect("valid mention regex"));

/// Live delivery failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishError(pub String);

impl Display for PublishError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "notification publish failed: {}", self.0)
    }
}

impl Error for PublishError {}

/// Pushes notification events to connected recipients.
pub trait Publisher: Send + Sync {
    /// Returns `Ok(false)` when the recipient has no live connection.
    fn publish(&self, event: &NotificationEvent) -> Result<bool, PublishError>;
}

/// Publisher for contexts without live delivery (CLI, tests).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPublisher;

impl Publisher for NoopPublisher {
    fn publish(&self, _event: &NotificationEvent) -> Result<bool, PublishError> {
        Ok(false)
    }
}

/// Response of read-state actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReadOutcome {
    pub read: bool,
    pub unread_count: u32,
}

pub struct NotificationService<'p, N: NotificationRepository> {
    repo: N,
    publisher: &'p dyn Publisher,
}

impl<'p, N: NotificationRepository> NotificationService<'p, N> {
    pub fn new(repo: N, publisher: &'p dyn Publisher) -> Self {
        Self { repo, publisher }
    }

    /// Stores `notification` and publishes it, unless `actor` is the
    /// recipient. Returns the stored notification.
    pub fn notify(
        &self,
        actor: &User,
        notification: Notification,
    ) -> ServiceResult<Option<Notification>> {
        if notification.user_id == actor.id {
            return Ok(None);
        }

        self.repo.create_notification(&notification)?;
        debug!(
            "event=notification_create module=notification status=ok kind={} notification_id={}",
            notification.kind.as_str(),
            notification.id
        );

        let event = NotificationEvent::from(&notification);
        match self.publisher.publish(&event) {
            Ok(true) => {}
            Ok(false) => debug!(
                "event=notification_publish module=notification status=skipped reason=no_live_connection notification_id={}",
                notification.id
            ),
            Err(err) => warn!(
                "event=notification_publish module=notification status=error notification_id={} error={}",
                notification.id, err
            ),
        }
        Ok(Some(notification))
    }

    pub fn notify_post_like(
        &self,
        actor: &User,
        post: &ForumPost,
    ) -> ServiceResult<Option<Notification>> {
        let message = format!(
            "{} liked your post '{}'",
            actor.username, post.fields.title
        );
        self.notify(
            actor,
            Notification::new(post.author_id, NotificationKind::PostLike, message)
                .with_post(post.meta.id)
                .with_user(actor.id),
        )
    }

    pub fn notify_comment_like(
        &self,
        actor: &User,
        comment: &Comment,
    ) -> ServiceResult<Option<Notification>> {
        let message = format!("{} liked your comment", actor.username);
        self.notify(
            actor,
            Notification::new(comment.author_id, NotificationKind::CommentLike, message)
                .with_post(comment.post_id)
                .with_comment(comment.meta.id)
                .with_user(actor.id),
        )
    }

    pub fn notify_new_comment(
        &self,
        actor: &User,
        post: &ForumPost,
        comment: &Comment,
    ) -> ServiceResult<Option<Notification>> {
        let message = format!(
            "{} commented on your post '{}'",
            actor.username, post.fields.title
        );
        self.notify(
            actor,
            Notification::new(post.author_id, NotificationKind::NewComment, message)
                .with_post(post.meta.id)
                .with_comment(comment.meta.id)
                .with_user(actor.id),
        )
    }

    pub fn notify_reply(
        &self,
        actor: &User,
        parent: &Comment,
        reply: &Comment,
    ) -> ServiceResult<Option<Notification>> {
        let message = format!("{} replied to your comment", actor.username);
        self.notify(
            actor,
            Notification::new(parent.author_id, NotificationKind::Reply, message)
                .with_post(reply.post_id)
                .with_comment(reply.meta.id)
                .with_user(actor.id),
        )
    }

    pub fn notify_mention(
        &self,
        actor: &User,
        mentioned: &User,
        post: &ForumPost,
        comment: Option<&Comment>,
    ) -> ServiceResult<Option<Notification>> {
        let context = if comment.is_some() { "a comment" } else { "a post" };
        let message = format!("{} mentioned you in {context}", actor.username);
        let mut notification = Notification::new(mentioned.id, NotificationKind::Mention, message)
            .with_post(post.meta.id)
            .with_user(actor.id);
        if let Some(comment) = comment {
            notification = notification.with_comment(comment.meta.id);
        }
        self.notify(actor, notification)
    }

    pub fn notify_moderation(
        &self,
        moderator: &User,
        post: &ForumPost,
        action: ModerationAction,
    ) -> ServiceResult<Option<Notification>> {
        let message = format!(
            "Your post '{}' was {} by a moderator",
            post.fields.title,
            action.past_tense()
        );
        self.notify(
            moderator,
            Notification::new(post.author_id, NotificationKind::Moderation, message)
                .with_post(post.meta.id)
                .with_user(moderator.id),
        )
    }

    /// Unread notifications of `actor`, newest first.
    pub fn list_unread(&self, actor: &User, limit: Option<u32>) -> ServiceResult<Vec<Notification>> {
        Ok(self.repo.list_unread(actor.id, limit)?)
    }

    pub fn unread_count(&self, actor: &User) -> ServiceResult<u32> {
        Ok(self.repo.count_unread(actor.id)?)
    }

    /// Marks one of `actor`'s notifications read. Notifications of other
    /// users are reported as not found.
    pub fn mark_read(&self, actor: &User, id: RecordId) -> ServiceResult<ReadOutcome> {
        if !self.repo.mark_read(id, actor.id)? {
            return Err(ServiceError::not_found(EntityKind::Notification, id));
        }
        Ok(ReadOutcome {
            read: true,
            unread_count: self.repo.count_unread(actor.id)?,
        })
    }

    pub fn mark_all_read(&self, actor: &User) -> ServiceResult<ReadOutcome> {
        let updated = self.repo.mark_all_read(actor.id)?;
        debug!(
            "event=notification_mark_all_read module=notification status=ok updated={}",
            updated
        );
        Ok(ReadOutcome {
            read: true,
            unread_count: self.repo.count_unread(actor.id)?,
        })
    }
}

/// Extracts `@username` mentions in first-seen order, without duplicates.
///
/// Matching is case-insensitive for deduplication; trailing dots are not
/// part of a username.
pub fn extract_mentions(content: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut mentions = Vec::new();
    for capture in MENTION_RE.captures_iter(content) {
        let Some(name) = capture.get(1) else {
            continue;
        };
        let username = name.as_str().trim_end_matches('.');
        if username.is_empty() {
            continue;
        }
        if seen.insert(username.to_lowercase()) {
            mentions.push(username.to_string());
        }
    }
    mentions
}
