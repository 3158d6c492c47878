//! Lesson/expression repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist lessons and their expressions.
//! - Run composed lesson list queries.
//!
//! # Invariants
//! - List queries only return `status = 'active'` rows.
//! - Expressions of a lesson are ordered oldest first.

use crate::model::lesson::{
    Country, Difficulty, Expression, ExpressionFields, Lesson, LessonCategory, LessonFields,
};
use crate::model::record::RecordId;
use crate::repo::common::{
    meta_columns, parse_meta, parse_optional_uuid, parse_uuid, soft_delete_row, RecordTable,
    RepoError, RepoResult,
};
use crate::search::LessonFilter;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

/// Repository interface for lessons and expressions.
pub trait LessonRepository {
    fn create_lesson(&self, lesson: &Lesson) -> RepoResult<RecordId>;
    /// Replaces editable fields of an active lesson.
    fn update_lesson(&self, lesson: &Lesson) -> RepoResult<()>;
    fn get_lesson(&self, id: RecordId, include_deleted: bool) -> RepoResult<Option<Lesson>>;
    fn list_lessons(&self, filter: &LessonFilter) -> RepoResult<Vec<Lesson>>;
    fn soft_delete_lesson(&self, id: RecordId) -> RepoResult<()>;

    fn create_expression(&self, expression: &Expression) -> RepoResult<RecordId>;
    fn update_expression(&self, expression: &Expression) -> RepoResult<()>;
    fn get_expression(&self, id: RecordId, include_deleted: bool)
        -> RepoResult<Option<Expression>>;
    /// Active expressions of one lesson, oldest first.
    fn list_expressions(&self, lesson_id: RecordId) -> RepoResult<Vec<Expression>>;
    fn soft_delete_expression(&self, id: RecordId) -> RepoResult<()>;
}

/// SQLite-backed lesson repository.
pub struct SqliteLessonRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLessonRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

fn lesson_select() -> String {
    format!(
        "SELECT {meta},
            l.author_id AS author_id,
            l.title AS title,
            l.description AS description,
            l.difficulty AS difficulty,
            l.category AS category,
            l.country AS country,
            l.video_url AS video_url,
            l.cultural_notes AS cultural_notes,
            l.cover_image AS cover_image
         FROM lessons l",
        meta = meta_columns("l")
    )
}

fn expression_select() -> String {
    format!(
        "SELECT {meta},
            e.lesson_id AS lesson_id,
            e.text AS text,
            e.meaning AS meaning,
            e.example AS example,
            e.audio AS audio
         FROM expressions e",
        meta = meta_columns("e")
    )
}

impl LessonRepository for SqliteLessonRepository<'_> {
    fn create_lesson(&self, lesson: &Lesson) -> RepoResult<RecordId> {
        let fields = &lesson.fields;
        self.conn.execute(
            "INSERT INTO lessons (
                id,
                author_id,
                title,
                description,
                difficulty,
                category,
                country,
                video_url,
                cultural_notes,
                cover_image,
                created_at,
                updated_at,
                status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 'active');",
            params![
                lesson.meta.id.to_string(),
                lesson.author_id.to_string(),
                fields.title.as_str(),
                fields.description.as_str(),
                fields.difficulty.as_str(),
                fields.category.as_str(),
                fields.country.code(),
                fields.video_url.as_deref(),
                fields.cultural_notes.as_deref(),
                fields.cover_image.as_deref(),
                lesson.meta.created_at,
                lesson.meta.updated_at,
            ],
        )?;
        Ok(lesson.meta.id)
    }

    fn update_lesson(&self, lesson: &Lesson) -> RepoResult<()> {
        let fields = &lesson.fields;
        let changed = self.conn.execute(
            "UPDATE lessons
             SET
                title = ?2,
                description = ?3,
                difficulty = ?4,
                category = ?5,
                country = ?6,
                video_url = ?7,
                cultural_notes = ?8,
                cover_image = ?9,
                updated_at = ?10
             WHERE id = ?1
               AND status = 'active';",
            params![
                lesson.meta.id.to_string(),
                fields.title.as_str(),
                fields.description.as_str(),
                fields.difficulty.as_str(),
                fields.category.as_str(),
                fields.country.code(),
                fields.video_url.as_deref(),
                fields.cultural_notes.as_deref(),
                fields.cover_image.as_deref(),
                lesson.meta.updated_at,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(lesson.meta.id));
        }
        Ok(())
    }

    fn get_lesson(&self, id: RecordId, include_deleted: bool) -> RepoResult<Option<Lesson>> {
        let mut sql = lesson_select();
        sql.push_str(" WHERE l.id = ?1");
        if !include_deleted {
            sql.push_str(" AND l.status = 'active'");
        }
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_lesson_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_lessons(&self, filter: &LessonFilter) -> RepoResult<Vec<Lesson>> {
        let select = format!("{} WHERE l.status = 'active'", lesson_select());
        let (sql, bind_values) = filter.compose(&select).into_parts();
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut lessons = Vec::new();
        while let Some(row) = rows.next()? {
            lessons.push(parse_lesson_row(row)?);
        }
        Ok(lessons)
    }

    fn soft_delete_lesson(&self, id: RecordId) -> RepoResult<()> {
        soft_delete_row(self.conn, RecordTable::Lessons, id)
    }

    fn create_expression(&self, expression: &Expression) -> RepoResult<RecordId> {
        let fields = &expression.fields;
        self.conn.execute(
            "INSERT INTO expressions (
                id,
                lesson_id,
                text,
                meaning,
                example,
                audio,
                created_at,
                updated_at,
                status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'active');",
            params![
                expression.meta.id.to_string(),
                expression.lesson_id.map(|id| id.to_string()),
                fields.text.as_deref(),
                fields.meaning.as_deref(),
                fields.example.as_deref(),
                fields.audio.as_deref(),
                expression.meta.created_at,
                expression.meta.updated_at,
            ],
        )?;
        Ok(expression.meta.id)
    }

    fn update_expression(&self, expression: &Expression) -> RepoResult<()> {
        let fields = &expression.fields;
        let changed = self.conn.execute(
            "UPDATE expressions
             SET
                text = ?2,
                meaning = ?3,
                example = ?4,
                audio = ?5,
                updated_at = ?6
             WHERE id = ?1
               AND status = 'active';",
            params![
                expression.meta.id.to_string(),
                fields.text.as_deref(),
                fields.meaning.as_deref(),
                fields.example.as_deref(),
                fields.audio.as_deref(),
                expression.meta.updated_at,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(expression.meta.id));
        }
        Ok(())
    }

    fn get_expression(
        &self,
        id: RecordId,
        include_deleted: bool,
    ) -> RepoResult<Option<Expression>> {
        let mut sql = expression_select();
        sql.push_str(" WHERE e.id = ?1");
        if !include_deleted {
            sql.push_str(" AND e.status = 'active'");
        }
        self.conn
            .query_row(&sql, [id.to_string()], |row| Ok(parse_expression_row(row)))
            .optional()?
            .transpose()
    }

    fn list_expressions(&self, lesson_id: RecordId) -> RepoResult<Vec<Expression>> {
        let sql = format!(
            "{} WHERE e.lesson_id = ?1 AND e.status = 'active' ORDER BY e.created_at ASC, e.rowid ASC",
            expression_select()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([lesson_id.to_string()])?;
        let mut expressions = Vec::new();
        while let Some(row) = rows.next()? {
            expressions.push(parse_expression_row(row)?);
        }
        Ok(expressions)
    }

    fn soft_delete_expression(&self, id: RecordId) -> RepoResult<()> {
        soft_delete_row(self.conn, RecordTable::Expressions, id)
    }
}

fn parse_lesson_row(row: &Row<'_>) -> RepoResult<Lesson> {
    let author_text: String = row.get("author_id")?;
    let difficulty_text: String = row.get("difficulty")?;
    let category_text: String = row.get("category")?;
    let country_text: String = row.get("country")?;

    let difficulty = Difficulty::parse(&difficulty_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid difficulty `{difficulty_text}` in lessons.difficulty"
        ))
    })?;
    let category = LessonCategory::parse(&category_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid category `{category_text}` in lessons.category"))
    })?;
    let country = Country::parse(&country_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid country `{country_text}` in lessons.country"))
    })?;

    Ok(Lesson {
        meta: parse_meta(row, "lessons")?,
        author_id: parse_uuid(&author_text, "lessons", "author_id")?,
        fields: LessonFields {
            title: row.get("title")?,
            description: row.get("description")?,
            difficulty,
            category,
            country,
            video_url: row.get("video_url")?,
            cultural_notes: row.get("cultural_notes")?,
            cover_image: row.get("cover_image")?,
        },
    })
}

fn parse_expression_row(row: &Row<'_>) -> RepoResult<Expression> {
    Ok(Expression {
        meta: parse_meta(row, "expressions")?,
        lesson_id: parse_optional_uuid(row.get("lesson_id")?, "expressions", "lesson_id")?,
        fields: ExpressionFields {
            text: row.get("text")?,
            meaning: row.get("meaning")?,
            example: row.get("example")?,
            audio: row.get("audio")?,
        },
    })
}
