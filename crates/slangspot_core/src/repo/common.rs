//! Shared repository error type and SQLite row helpers.
//!
//! # Responsibility
//! - Define [`RepoError`] used by every repository.
//! - Provide soft-delete, like-toggle and row-parsing helpers shared by
//!   entity repositories.
//!
//! # Invariants
//! - Soft delete never removes a row and keeps the first `deleted_at`.
//! - Like toggles run inside one immediate transaction.
//! - Read paths reject invalid persisted state with `InvalidData`.

use crate::db::DbError;
use crate::model::record::{now_epoch_ms, LikeOutcome, RecordId, RecordMeta, RecordStatus, UserId};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(RecordId),
    /// A uniqueness or reference constraint rejected the write.
    Conflict(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::Conflict(message) => write!(f, "constraint conflict: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::Conflict(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match &value {
            rusqlite::Error::SqliteFailure(failure, message)
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                Self::Conflict(
                    message
                        .clone()
                        .unwrap_or_else(|| "constraint violation".to_string()),
                )
            }
            _ => Self::Db(DbError::Sqlite(value)),
        }
    }
}

/// Column list matching [`parse_meta`], to be prefixed with a table alias.
pub(crate) fn meta_columns(alias: &str) -> String {
    format!(
        "{alias}.id AS id, {alias}.created_at AS created_at, {alias}.updated_at AS updated_at, \
         {alias}.status AS status, {alias}.deleted_at AS deleted_at"
    )
}

/// Parses the common record columns of one row.
pub(crate) fn parse_meta(row: &Row<'_>, table: &str) -> RepoResult<RecordMeta> {
    let id_text: String = row.get("id")?;
    let status_text: String = row.get("status")?;
    let status = RecordStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in {table}.status"))
    })?;
    let deleted_at: Option<i64> = row.get("deleted_at")?;
    if status == RecordStatus::Deleted && deleted_at.is_none() {
        return Err(RepoError::InvalidData(format!(
            "deleted row {id_text} in {table} has no deleted_at"
        )));
    }

    Ok(RecordMeta {
        id: parse_uuid(&id_text, table, "id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        status,
        deleted_at,
    })
}

pub(crate) fn parse_uuid(value: &str, table: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{value}` in {table}.{column}"))
    })
}

pub(crate) fn parse_optional_uuid(
    value: Option<String>,
    table: &str,
    column: &str,
) -> RepoResult<Option<Uuid>> {
    value
        .map(|text| parse_uuid(&text, table, column))
        .transpose()
}

pub(crate) fn parse_bool(value: i64, table: &str, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {table}.{column}"
        ))),
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

/// Tables holding soft-deletable records.
#[derive(Debug, Clone, Copy)]
pub(crate) enum RecordTable {
    Lessons,
    Expressions,
    ForumPosts,
    Comments,
    BlogPosts,
    Practices,
}

impl RecordTable {
    fn name(self) -> &'static str {
        match self {
            Self::Lessons => "lessons",
            Self::Expressions => "expressions",
            Self::ForumPosts => "forum_posts",
            Self::Comments => "comments",
            Self::BlogPosts => "blog_posts",
            Self::Practices => "practices",
        }
    }
}

/// Marks one row deleted. Repeating the call keeps the first `deleted_at`.
pub(crate) fn soft_delete_row(conn: &Connection, table: RecordTable, id: RecordId) -> RepoResult<()> {
    let sql = format!(
        "UPDATE {table}
         SET
            deleted_at = COALESCE(deleted_at, ?2),
            updated_at = CASE WHEN status = 'deleted' THEN updated_at ELSE ?2 END,
            status = 'deleted'
         WHERE id = ?1;",
        table = table.name()
    );
    let changed = conn.execute(&sql, params![id.to_string(), now_epoch_ms()])?;
    if changed == 0 {
        return Err(RepoError::NotFound(id));
    }
    Ok(())
}

/// Join tables recording who liked what.
#[derive(Debug, Clone, Copy)]
pub(crate) enum LikeTable {
    ForumPosts,
    Comments,
    BlogPosts,
}

impl LikeTable {
    fn name(self) -> &'static str {
        match self {
            Self::ForumPosts => "forum_post_likes",
            Self::Comments => "comment_likes",
            Self::BlogPosts => "blog_post_likes",
        }
    }

    fn target_column(self) -> &'static str {
        match self {
            Self::ForumPosts | Self::BlogPosts => "post_id",
            Self::Comments => "comment_id",
        }
    }
}

/// Adds or removes `user_id` from the liker set of `target_id`.
pub(crate) fn toggle_like(
    conn: &Connection,
    table: LikeTable,
    target_id: RecordId,
    user_id: UserId,
) -> RepoResult<LikeOutcome> {
    let target = target_id.to_string();
    let user = user_id.to_string();
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;

    let existing: Option<i64> = tx
        .query_row(
            &format!(
                "SELECT 1 FROM {table} WHERE {column} = ?1 AND user_id = ?2;",
                table = table.name(),
                column = table.target_column()
            ),
            params![target.as_str(), user.as_str()],
            |row| row.get(0),
        )
        .optional()?;

    let liked = if existing.is_some() {
        tx.execute(
            &format!(
                "DELETE FROM {table} WHERE {column} = ?1 AND user_id = ?2;",
                table = table.name(),
                column = table.target_column()
            ),
            params![target.as_str(), user.as_str()],
        )?;
        false
    } else {
        tx.execute(
            &format!(
                "INSERT INTO {table} ({column}, user_id, created_at) VALUES (?1, ?2, ?3);",
                table = table.name(),
                column = table.target_column()
            ),
            params![target.as_str(), user.as_str(), now_epoch_ms()],
        )?;
        true
    };

    let likes_count = count_likes(&tx, table, target_id)?;
    tx.commit()?;

    Ok(LikeOutcome { liked, likes_count })
}

pub(crate) fn count_likes(conn: &Connection, table: LikeTable, target_id: RecordId) -> RepoResult<u32> {
    let count: u32 = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM {table} WHERE {column} = ?1;",
            table = table.name(),
            column = table.target_column()
        ),
        [target_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub(crate) fn has_liked(
    conn: &Connection,
    table: LikeTable,
    target_id: RecordId,
    user_id: UserId,
) -> RepoResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            &format!(
                "SELECT 1 FROM {table} WHERE {column} = ?1 AND user_id = ?2;",
                table = table.name(),
                column = table.target_column()
            ),
            params![target_id.to_string(), user_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Normalizes a page size: `None`/0 selects `default`, larger values clamp.
pub fn normalize_limit(limit: Option<u32>, default: u32, max: u32) -> u32 {
    match limit {
        Some(0) | None => default,
        Some(value) => value.min(max),
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_limit, RepoError};

    #[test]
    fn normalize_limit_defaults_and_clamps() {
        assert_eq!(normalize_limit(None, 20, 100), 20);
        assert_eq!(normalize_limit(Some(0), 20, 100), 20);
        assert_eq!(normalize_limit(Some(7), 20, 100), 7);
        assert_eq!(normalize_limit(Some(500), 20, 100), 100);
    }

    #[test]
    fn constraint_failures_map_to_conflict() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (name TEXT UNIQUE); INSERT INTO t VALUES ('a');")
            .unwrap();
        let err: RepoError = conn
            .execute("INSERT INTO t VALUES ('a');", [])
            .unwrap_err()
            .into();
        assert!(matches!(err, RepoError::Conflict(_)));
    }
}
