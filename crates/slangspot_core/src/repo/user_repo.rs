//! User account repository.

use crate::model::record::UserId;
use crate::model::user::User;
use crate::repo::common::{bool_to_int, parse_bool, parse_uuid, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT
    id,
    username,
    email,
    is_superuser,
    is_staff,
    created_at
FROM users";

pub trait UserRepository {
    fn create_user(&self, user: &User) -> RepoResult<UserId>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Case-insensitive lookup.
    fn find_by_username(&self, username: &str) -> RepoResult<Option<User>>;
}

pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &User) -> RepoResult<UserId> {
        self.conn.execute(
            "INSERT INTO users (id, username, email, is_superuser, is_staff, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                user.id.to_string(),
                user.username.as_str(),
                user.email.as_str(),
                bool_to_int(user.is_superuser),
                bool_to_int(user.is_staff),
                user.created_at,
            ],
        )?;
        Ok(user.id)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let sql = format!("{USER_SELECT_SQL} WHERE id = ?1;");
        self.conn
            .query_row(&sql, [id.to_string()], |row| Ok(parse_user_row(row)))
            .optional()?
            .transpose()
    }

    fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let sql = format!("{USER_SELECT_SQL} WHERE username = ?1 COLLATE NOCASE;");
        self.conn
            .query_row(&sql, [username], |row| Ok(parse_user_row(row)))
            .optional()?
            .transpose()
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let id_text: String = row.get("id")?;
    Ok(User {
        id: parse_uuid(&id_text, "users", "id")?,
        username: row.get("username")?,
        email: row.get("email")?,
        is_superuser: parse_bool(row.get("is_superuser")?, "users", "is_superuser")?,
        is_staff: parse_bool(row.get("is_staff")?, "users", "is_staff")?,
        created_at: row.get("created_at")?,
    })
}
