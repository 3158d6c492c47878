//! Practice repository; every listing is scoped to one owner.

use crate::model::practice::{Practice, PracticeDifficulty, PracticeFields};
use crate::model::record::{RecordId, UserId};
use crate::repo::common::{
    normalize_limit, parse_meta, parse_uuid, soft_delete_row, RecordTable, RepoError, RepoResult,
};
use rusqlite::{params, Connection, OptionalExtension, Row};

const PRACTICES_DEFAULT_LIMIT: u32 = 20;
const PRACTICES_LIMIT_MAX: u32 = 100;

const PRACTICE_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    title,
    content,
    difficulty,
    created_at,
    updated_at,
    status,
    deleted_at
FROM practices";

pub trait PracticeRepository {
    fn create_practice(&self, practice: &Practice) -> RepoResult<RecordId>;
    fn update_practice(&self, practice: &Practice) -> RepoResult<()>;
    fn get_practice(&self, id: RecordId, include_deleted: bool) -> RepoResult<Option<Practice>>;
    /// Active practices of `user_id`, newest first.
    fn list_practices(
        &self,
        user_id: UserId,
        limit: Option<u32>,
        offset: u32,
    ) -> RepoResult<Vec<Practice>>;
    fn soft_delete_practice(&self, id: RecordId) -> RepoResult<()>;
}

pub struct SqlitePracticeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePracticeRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PracticeRepository for SqlitePracticeRepository<'_> {
    fn create_practice(&self, practice: &Practice) -> RepoResult<RecordId> {
        self.conn.execute(
            "INSERT INTO practices (
                id,
                user_id,
                title,
                content,
                difficulty,
                created_at,
                updated_at,
                status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'active');",
            params![
                practice.meta.id.to_string(),
                practice.user_id.to_string(),
                practice.fields.title.as_str(),
                practice.fields.content.as_str(),
                practice.fields.difficulty.as_str(),
                practice.meta.created_at,
                practice.meta.updated_at,
            ],
        )?;
        Ok(practice.meta.id)
    }

    fn update_practice(&self, practice: &Practice) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE practices
             SET title = ?2, content = ?3, difficulty = ?4, updated_at = ?5
             WHERE id = ?1
               AND status = 'active';",
            params![
                practice.meta.id.to_string(),
                practice.fields.title.as_str(),
                practice.fields.content.as_str(),
                practice.fields.difficulty.as_str(),
                practice.meta.updated_at,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(practice.meta.id));
        }
        Ok(())
    }

    fn get_practice(&self, id: RecordId, include_deleted: bool) -> RepoResult<Option<Practice>> {
        let mut sql = format!("{PRACTICE_SELECT_SQL} WHERE id = ?1");
        if !include_deleted {
            sql.push_str(" AND status = 'active'");
        }
        self.conn
            .query_row(&sql, [id.to_string()], |row| Ok(parse_practice_row(row)))
            .optional()?
            .transpose()
    }

    fn list_practices(
        &self,
        user_id: UserId,
        limit: Option<u32>,
        offset: u32,
    ) -> RepoResult<Vec<Practice>> {
        let sql = format!(
            "{PRACTICE_SELECT_SQL}
             WHERE user_id = ?1
               AND status = 'active'
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?2 OFFSET ?3;"
        );
        let limit = normalize_limit(limit, PRACTICES_DEFAULT_LIMIT, PRACTICES_LIMIT_MAX);
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![
            user_id.to_string(),
            i64::from(limit),
            i64::from(offset)
        ])?;
        let mut practices = Vec::new();
        while let Some(row) = rows.next()? {
            practices.push(parse_practice_row(row)?);
        }
        Ok(practices)
    }

    fn soft_delete_practice(&self, id: RecordId) -> RepoResult<()> {
        soft_delete_row(self.conn, RecordTable::Practices, id)
    }
}

fn parse_practice_row(row: &Row<'_>) -> RepoResult<Practice> {
    let user_text: String = row.get("user_id")?;
    let difficulty_text: String = row.get("difficulty")?;
    let difficulty = PracticeDifficulty::parse(&difficulty_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid difficulty `{difficulty_text}` in practices.difficulty"
        ))
    })?;
    Ok(Practice {
        meta: parse_meta(row, "practices")?,
        user_id: parse_uuid(&user_text, "practices", "user_id")?,
        fields: PracticeFields {
            title: row.get("title")?,
            content: row.get("content")?,
            difficulty,
        },
    })
}
