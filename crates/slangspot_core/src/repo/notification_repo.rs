//! Notification repository.
//!
//! # Invariants
//! - Read-state updates are scoped to the recipient; another user's
//!   notification is never touched.

use crate::model::notification::{Notification, NotificationKind};
use crate::model::record::{RecordId, UserId};
use crate::repo::common::{
    bool_to_int, normalize_limit, parse_bool, parse_optional_uuid, parse_uuid, RepoError,
    RepoResult,
};
use rusqlite::{params, Connection, Row};

const NOTIFICATIONS_DEFAULT_LIMIT: u32 = 50;
const NOTIFICATIONS_LIMIT_MAX: u32 = 200;

const NOTIFICATION_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    kind,
    message,
    related_post_id,
    related_comment_id,
    related_user_id,
    is_read,
    created_at
FROM notifications";

pub trait NotificationRepository {
    fn create_notification(&self, notification: &Notification) -> RepoResult<RecordId>;
    /// Unread notifications of `user_id`, newest first.
    fn list_unread(&self, user_id: UserId, limit: Option<u32>) -> RepoResult<Vec<Notification>>;
    fn count_unread(&self, user_id: UserId) -> RepoResult<u32>;
    /// Marks one notification read. Returns `false` when no notification
    /// with that id belongs to `user_id`.
    fn mark_read(&self, id: RecordId, user_id: UserId) -> RepoResult<bool>;
    /// Marks every unread notification of `user_id` read; returns the count.
    fn mark_all_read(&self, user_id: UserId) -> RepoResult<u32>;
}

pub struct SqliteNotificationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNotificationRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl NotificationRepository for SqliteNotificationRepository<'_> {
    fn create_notification(&self, notification: &Notification) -> RepoResult<RecordId> {
        self.conn.execute(
            "INSERT INTO notifications (
                id,
                user_id,
                kind,
                message,
                related_post_id,
                related_comment_id,
                related_user_id,
                is_read,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                notification.id.to_string(),
                notification.user_id.to_string(),
                notification.kind.as_str(),
                notification.message.as_str(),
                notification.related_post_id.map(|id| id.to_string()),
                notification.related_comment_id.map(|id| id.to_string()),
                notification.related_user_id.map(|id| id.to_string()),
                bool_to_int(notification.is_read),
                notification.created_at,
            ],
        )?;
        Ok(notification.id)
    }

    fn list_unread(&self, user_id: UserId, limit: Option<u32>) -> RepoResult<Vec<Notification>> {
        let sql = format!(
            "{NOTIFICATION_SELECT_SQL}
             WHERE user_id = ?1
               AND is_read = 0
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?2;"
        );
        let limit = normalize_limit(limit, NOTIFICATIONS_DEFAULT_LIMIT, NOTIFICATIONS_LIMIT_MAX);
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![user_id.to_string(), i64::from(limit)])?;
        let mut notifications = Vec::new();
        while let Some(row) = rows.next()? {
            notifications.push(parse_notification_row(row)?);
        }
        Ok(notifications)
    }

    fn count_unread(&self, user_id: UserId) -> RepoResult<u32> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND is_read = 0;",
            [user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn mark_read(&self, id: RecordId, user_id: UserId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND user_id = ?2;",
            params![id.to_string(), user_id.to_string()],
        )?;
        Ok(changed > 0)
    }

    fn mark_all_read(&self, user_id: UserId) -> RepoResult<u32> {
        let changed = self.conn.execute(
            "UPDATE notifications SET is_read = 1 WHERE user_id = ?1 AND is_read = 0;",
            [user_id.to_string()],
        )?;
        u32::try_from(changed)
            .map_err(|_| RepoError::InvalidData(format!("updated row count {changed} overflows")))
    }
}

fn parse_notification_row(row: &Row<'_>) -> RepoResult<Notification> {
    let id_text: String = row.get("id")?;
    let user_text: String = row.get("user_id")?;
    let kind_text: String = row.get("kind")?;
    let kind = NotificationKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid kind `{kind_text}` in notifications.kind"))
    })?;

    Ok(Notification {
        id: parse_uuid(&id_text, "notifications", "id")?,
        user_id: parse_uuid(&user_text, "notifications", "user_id")?,
        kind,
        message: row.get("message")?,
        related_post_id: parse_optional_uuid(
            row.get("related_post_id")?,
            "notifications",
            "related_post_id",
        )?,
        related_comment_id: parse_optional_uuid(
            row.get("related_comment_id")?,
            "notifications",
            "related_comment_id",
        )?,
        related_user_id: parse_optional_uuid(
            row.get("related_user_id")?,
            "notifications",
            "related_user_id",
        )?,
        is_read: parse_bool(row.get("is_read")?, "notifications", "is_read")?,
        created_at: row.get("created_at")?,
    })
}
