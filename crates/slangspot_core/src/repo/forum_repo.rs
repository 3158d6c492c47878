//! Forum repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist forum posts with their tag set, comments, likes and categories.
//! - Provide forum read models (stats, popularity, recent activity).
//!
//! # Invariants
//! - Post tag links are replaced as a whole inside one immediate transaction.
//! - Tag names are stored lowercase; `tags.name` is unique.
//! - Comment and post lists only return `status = 'active'` rows.

use crate::model::forum::{Category, Comment, ForumPost, ForumPostFields, Tag};
use crate::model::record::{LikeOutcome, RecordId, UserId};
use crate::model::slug::slugify;
use crate::repo::common::{
    bool_to_int, count_likes, has_liked, meta_columns, parse_bool, parse_meta,
    parse_optional_uuid, parse_uuid, soft_delete_row, toggle_like, LikeTable, RecordTable,
    RepoError, RepoResult,
};
use crate::search::PostFilter;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction, TransactionBehavior,
};
use serde::Serialize;

/// Like and comment counters of one post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PostStats {
    pub likes_count: u32,
    pub comments_count: u32,
}

/// Aggregate forum activity of one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub posts_count: u32,
    pub comments_count: u32,
    pub likes_received: u32,
}

/// Post with its popularity score (likes plus active comments).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopularPost {
    pub post: ForumPost,
    pub popularity: u32,
}

/// Repository interface for forum operations.
pub trait ForumRepository {
    fn create_post(&self, post: &ForumPost) -> RepoResult<RecordId>;
    /// Replaces editable fields, flags and the whole tag set.
    fn update_post(&self, post: &ForumPost) -> RepoResult<()>;
    fn get_post(&self, id: RecordId, include_deleted: bool) -> RepoResult<Option<ForumPost>>;
    fn list_posts(&self, filter: &PostFilter) -> RepoResult<Vec<ForumPost>>;
    fn post_slug_exists(&self, slug: &str) -> RepoResult<bool>;
    fn increment_post_views(&self, id: RecordId) -> RepoResult<()>;
    fn soft_delete_post(&self, id: RecordId) -> RepoResult<()>;
    fn toggle_post_like(&self, post_id: RecordId, user_id: UserId) -> RepoResult<LikeOutcome>;
    fn has_liked_post(&self, post_id: RecordId, user_id: UserId) -> RepoResult<bool>;
    fn post_stats(&self, post_id: RecordId) -> RepoResult<PostStats>;
    /// Active posts created at or after `since`, most popular first.
    fn popular_posts(&self, since: i64, limit: u32) -> RepoResult<Vec<PopularPost>>;

    /// Runs `work` inside one immediate transaction; an `Err` rolls back every
    /// write made through this connection meanwhile.
    fn in_transaction<T, E>(&self, work: impl FnOnce() -> Result<T, E>) -> Result<T, E>
    where
        E: From<RepoError>;

    fn create_comment(&self, comment: &Comment) -> RepoResult<RecordId>;
    fn update_comment(&self, comment: &Comment) -> RepoResult<()>;
    fn get_comment(&self, id: RecordId, include_deleted: bool) -> RepoResult<Option<Comment>>;
    /// Active comments without a parent, newest first.
    fn list_top_level_comments(&self, post_id: RecordId) -> RepoResult<Vec<Comment>>;
    /// Active replies of one comment, oldest first.
    fn list_replies(&self, comment_id: RecordId) -> RepoResult<Vec<Comment>>;
    fn soft_delete_comment(&self, id: RecordId) -> RepoResult<()>;
    fn toggle_comment_like(
        &self,
        comment_id: RecordId,
        user_id: UserId,
    ) -> RepoResult<LikeOutcome>;
    fn comment_like_count(&self, comment_id: RecordId) -> RepoResult<u32>;

    fn create_category(&self, category: &Category) -> RepoResult<RecordId>;
    fn get_category(&self, id: RecordId) -> RepoResult<Option<Category>>;
    fn list_categories(&self) -> RepoResult<Vec<Category>>;
    fn category_slug_exists(&self, slug: &str) -> RepoResult<bool>;
    fn list_tags(&self) -> RepoResult<Vec<Tag>>;

    fn user_stats(&self, user_id: UserId) -> RepoResult<UserStats>;
    fn recent_posts_by(&self, user_id: UserId, since: i64) -> RepoResult<Vec<ForumPost>>;
    fn recent_comments_by(&self, user_id: UserId, since: i64) -> RepoResult<Vec<Comment>>;
}

/// SQLite-backed forum repository.
pub struct SqliteForumRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteForumRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_posts(
        &self,
        sql: &str,
        bind_values: impl rusqlite::Params,
    ) -> RepoResult<Vec<ForumPost>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(bind_values)?;
        let mut posts = Vec::new();
        while let Some(row) = rows.next()? {
            posts.push(parse_post_row(self.conn, row)?);
        }
        Ok(posts)
    }

    fn query_comments(
        &self,
        sql: &str,
        bind_values: impl rusqlite::Params,
    ) -> RepoResult<Vec<Comment>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(bind_values)?;
        let mut comments = Vec::new();
        while let Some(row) = rows.next()? {
            comments.push(parse_comment_row(row)?);
        }
        Ok(comments)
    }

    fn count(&self, sql: &str, id: &str) -> RepoResult<u32> {
        let count: u32 = self.conn.query_row(sql, [id], |row| row.get(0))?;
        Ok(count)
    }
}

fn post_select() -> String {
    format!(
        "SELECT {meta},
            p.author_id AS author_id,
            p.title AS title,
            p.content AS content,
            p.slug AS slug,
            p.views AS views,
            p.is_pinned AS is_pinned,
            p.is_closed AS is_closed,
            p.category_id AS category_id
         FROM forum_posts p",
        meta = meta_columns("p")
    )
}

fn comment_select() -> String {
    format!(
        "SELECT {meta},
            c.post_id AS post_id,
            c.author_id AS author_id,
            c.parent_id AS parent_id,
            c.content AS content
         FROM comments c",
        meta = meta_columns("c")
    )
}

const CATEGORY_SELECT_SQL: &str = "SELECT
    id,
    name,
    slug,
    description,
    parent_id,
    created_at,
    updated_at,
    status,
    deleted_at
FROM categories";

const POST_POPULARITY_SQL: &str = "((SELECT COUNT(*) FROM forum_post_likes pl WHERE pl.post_id = p.id)
    + (SELECT COUNT(*) FROM comments pc WHERE pc.post_id = p.id AND pc.status = 'active'))";

impl ForumRepository for SqliteForumRepository<'_> {
    fn create_post(&self, post: &ForumPost) -> RepoResult<RecordId> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO forum_posts (
                id,
                author_id,
                title,
                content,
                slug,
                views,
                is_pinned,
                is_closed,
                category_id,
                created_at,
                updated_at,
                status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 'active');",
            params![
                post.meta.id.to_string(),
                post.author_id.to_string(),
                post.fields.title.as_str(),
                post.fields.content.as_str(),
                post.slug.as_str(),
                post.views,
                bool_to_int(post.is_pinned),
                bool_to_int(post.is_closed),
                post.fields.category_id.map(|id| id.to_string()),
                post.meta.created_at,
                post.meta.updated_at,
            ],
        )?;
        replace_post_tags(&tx, post.meta.id, &post.fields.tags)?;
        tx.commit()?;
        Ok(post.meta.id)
    }

    fn update_post(&self, post: &ForumPost) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE forum_posts
             SET
                title = ?2,
                content = ?3,
                category_id = ?4,
                is_pinned = ?5,
                is_closed = ?6,
                updated_at = ?7
             WHERE id = ?1
               AND status = 'active';",
            params![
                post.meta.id.to_string(),
                post.fields.title.as_str(),
                post.fields.content.as_str(),
                post.fields.category_id.map(|id| id.to_string()),
                bool_to_int(post.is_pinned),
                bool_to_int(post.is_closed),
                post.meta.updated_at,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(post.meta.id));
        }
        replace_post_tags(&tx, post.meta.id, &post.fields.tags)?;
        tx.commit()?;
        Ok(())
    }

    fn get_post(&self, id: RecordId, include_deleted: bool) -> RepoResult<Option<ForumPost>> {
        let mut sql = post_select();
        sql.push_str(" WHERE p.id = ?1");
        if !include_deleted {
            sql.push_str(" AND p.status = 'active'");
        }
        Ok(self.query_posts(&sql, [id.to_string()])?.into_iter().next())
    }

    fn list_posts(&self, filter: &PostFilter) -> RepoResult<Vec<ForumPost>> {
        let select = format!("{} WHERE p.status = 'active'", post_select());
        let (sql, bind_values) = filter.compose(&select).into_parts();
        self.query_posts(&sql, params_from_iter(bind_values))
    }

    fn post_slug_exists(&self, slug: &str) -> RepoResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM forum_posts WHERE slug = ?1;",
                [slug],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn increment_post_views(&self, id: RecordId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE forum_posts SET views = views + 1 WHERE id = ?1 AND status = 'active';",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn soft_delete_post(&self, id: RecordId) -> RepoResult<()> {
        soft_delete_row(self.conn, RecordTable::ForumPosts, id)
    }

    fn toggle_post_like(&self, post_id: RecordId, user_id: UserId) -> RepoResult<LikeOutcome> {
        toggle_like(self.conn, LikeTable::ForumPosts, post_id, user_id)
    }

    fn has_liked_post(&self, post_id: RecordId, user_id: UserId) -> RepoResult<bool> {
        has_liked(self.conn, LikeTable::ForumPosts, post_id, user_id)
    }

    fn post_stats(&self, post_id: RecordId) -> RepoResult<PostStats> {
        let id = post_id.to_string();
        Ok(PostStats {
            likes_count: count_likes(self.conn, LikeTable::ForumPosts, post_id)?,
            comments_count: self.count(
                "SELECT COUNT(*) FROM comments WHERE post_id = ?1 AND status = 'active';",
                &id,
            )?,
        })
    }

    fn popular_posts(&self, since: i64, limit: u32) -> RepoResult<Vec<PopularPost>> {
        let select = post_select().replacen(
            " FROM forum_posts p",
            &format!(", {POST_POPULARITY_SQL} AS popularity FROM forum_posts p"),
            1,
        );
        let sql = format!(
            "{select}
             WHERE p.status = 'active'
               AND p.created_at >= ?1
             ORDER BY popularity DESC, p.created_at DESC, p.rowid DESC
             LIMIT ?2;"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![since, i64::from(limit)])?;
        let mut posts = Vec::new();
        while let Some(row) = rows.next()? {
            posts.push(PopularPost {
                post: parse_post_row(self.conn, row)?,
                popularity: row.get("popularity")?,
            });
        }
        Ok(posts)
    }

    fn in_transaction<T, E>(&self, work: impl FnOnce() -> Result<T, E>) -> Result<T, E>
    where
        E: From<RepoError>,
    {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(RepoError::from)?;
        let value = work()?;
        tx.commit().map_err(RepoError::from)?;
        Ok(value)
    }

    fn create_comment(&self, comment: &Comment) -> RepoResult<RecordId> {
        self.conn.execute(
            "INSERT INTO comments (
                id,
                post_id,
                author_id,
                parent_id,
                content,
                created_at,
                updated_at,
                status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'active');",
            params![
                comment.meta.id.to_string(),
                comment.post_id.to_string(),
                comment.author_id.to_string(),
                comment.parent_id.map(|id| id.to_string()),
                comment.content.as_str(),
                comment.meta.created_at,
                comment.meta.updated_at,
            ],
        )?;
        Ok(comment.meta.id)
    }

    fn update_comment(&self, comment: &Comment) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE comments
             SET content = ?2, updated_at = ?3
             WHERE id = ?1
               AND status = 'active';",
            params![
                comment.meta.id.to_string(),
                comment.content.as_str(),
                comment.meta.updated_at,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(comment.meta.id));
        }
        Ok(())
    }

    fn get_comment(&self, id: RecordId, include_deleted: bool) -> RepoResult<Option<Comment>> {
        let mut sql = comment_select();
        sql.push_str(" WHERE c.id = ?1");
        if !include_deleted {
            sql.push_str(" AND c.status = 'active'");
        }
        Ok(self.query_comments(&sql, [id.to_string()])?.into_iter().next())
    }

    fn list_top_level_comments(&self, post_id: RecordId) -> RepoResult<Vec<Comment>> {
        let sql = format!(
            "{}
             WHERE c.post_id = ?1
               AND c.parent_id IS NULL
               AND c.status = 'active'
             ORDER BY c.created_at DESC, c.rowid DESC;",
            comment_select()
        );
        self.query_comments(&sql, [post_id.to_string()])
    }

    fn list_replies(&self, comment_id: RecordId) -> RepoResult<Vec<Comment>> {
        let sql = format!(
            "{}
             WHERE c.parent_id = ?1
               AND c.status = 'active'
             ORDER BY c.created_at ASC, c.rowid ASC;",
            comment_select()
        );
        self.query_comments(&sql, [comment_id.to_string()])
    }

    fn soft_delete_comment(&self, id: RecordId) -> RepoResult<()> {
        soft_delete_row(self.conn, RecordTable::Comments, id)
    }

    fn toggle_comment_like(
        &self,
        comment_id: RecordId,
        user_id: UserId,
    ) -> RepoResult<LikeOutcome> {
        toggle_like(self.conn, LikeTable::Comments, comment_id, user_id)
    }

    fn comment_like_count(&self, comment_id: RecordId) -> RepoResult<u32> {
        count_likes(self.conn, LikeTable::Comments, comment_id)
    }

    fn create_category(&self, category: &Category) -> RepoResult<RecordId> {
        self.conn.execute(
            "INSERT INTO categories (
                id,
                name,
                slug,
                description,
                parent_id,
                created_at,
                updated_at,
                status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'active');",
            params![
                category.meta.id.to_string(),
                category.name.as_str(),
                category.slug.as_str(),
                category.description.as_str(),
                category.parent_id.map(|id| id.to_string()),
                category.meta.created_at,
                category.meta.updated_at,
            ],
        )?;
        Ok(category.meta.id)
    }

    fn get_category(&self, id: RecordId) -> RepoResult<Option<Category>> {
        let sql = format!("{CATEGORY_SELECT_SQL} WHERE id = ?1 AND status = 'active';");
        self.conn
            .query_row(&sql, [id.to_string()], |row| Ok(parse_category_row(row)))
            .optional()?
            .transpose()
    }

    fn list_categories(&self) -> RepoResult<Vec<Category>> {
        let sql = format!(
            "{CATEGORY_SELECT_SQL} WHERE status = 'active' ORDER BY name COLLATE NOCASE ASC;"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            categories.push(parse_category_row(row)?);
        }
        Ok(categories)
    }

    fn category_slug_exists(&self, slug: &str) -> RepoResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM categories WHERE slug = ?1;", [slug], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(found.is_some())
    }

    fn list_tags(&self) -> RepoResult<Vec<Tag>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, slug FROM tags ORDER BY name ASC;")?;
        let mut rows = stmt.query([])?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            tags.push(Tag {
                id: row.get("id")?,
                name: row.get("name")?,
                slug: row.get("slug")?,
            });
        }
        Ok(tags)
    }

    fn user_stats(&self, user_id: UserId) -> RepoResult<UserStats> {
        let id = user_id.to_string();
        Ok(UserStats {
            posts_count: self.count(
                "SELECT COUNT(*) FROM forum_posts WHERE author_id = ?1 AND status = 'active';",
                &id,
            )?,
            comments_count: self.count(
                "SELECT COUNT(*) FROM comments WHERE author_id = ?1 AND status = 'active';",
                &id,
            )?,
            likes_received: self.count(
                "SELECT COUNT(*)
                 FROM forum_post_likes l
                 INNER JOIN forum_posts p ON p.id = l.post_id
                 WHERE p.author_id = ?1
                   AND p.status = 'active';",
                &id,
            )?,
        })
    }

    fn recent_posts_by(&self, user_id: UserId, since: i64) -> RepoResult<Vec<ForumPost>> {
        let sql = format!(
            "{}
             WHERE p.author_id = ?1
               AND p.created_at >= ?2
               AND p.status = 'active'
             ORDER BY p.created_at DESC, p.rowid DESC;",
            post_select()
        );
        self.query_posts(&sql, params![user_id.to_string(), since])
    }

    fn recent_comments_by(&self, user_id: UserId, since: i64) -> RepoResult<Vec<Comment>> {
        let sql = format!(
            "{}
             WHERE c.author_id = ?1
               AND c.created_at >= ?2
               AND c.status = 'active'
             ORDER BY c.created_at DESC, c.rowid DESC;",
            comment_select()
        );
        self.query_comments(&sql, params![user_id.to_string(), since])
    }
}

/// Replaces the post's tag links; creates missing tags on the way.
fn replace_post_tags(tx: &Transaction<'_>, post_id: RecordId, tags: &[String]) -> RepoResult<()> {
    let post_text = post_id.to_string();
    tx.execute(
        "DELETE FROM forum_post_tags WHERE post_id = ?1;",
        [post_text.as_str()],
    )?;
    for tag in tags {
        tx.execute(
            "INSERT OR IGNORE INTO tags (name, slug) VALUES (?1, ?2);",
            params![tag.as_str(), slugify(tag)],
        )?;
        tx.execute(
            "INSERT OR IGNORE INTO forum_post_tags (post_id, tag_id)
             SELECT ?1, id
             FROM tags
             WHERE name = ?2 COLLATE NOCASE;",
            params![post_text.as_str(), tag.as_str()],
        )?;
    }
    Ok(())
}

fn load_post_tags(conn: &Connection, post_id: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT t.name
         FROM forum_post_tags pt
         INNER JOIN tags t ON t.id = pt.tag_id
         WHERE pt.post_id = ?1
         ORDER BY t.name ASC;",
    )?;
    let mut rows = stmt.query([post_id])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        tags.push(row.get::<_, String>(0)?);
    }
    Ok(tags)
}

fn parse_post_row(conn: &Connection, row: &Row<'_>) -> RepoResult<ForumPost> {
    let meta = parse_meta(row, "forum_posts")?;
    let author_text: String = row.get("author_id")?;
    let tags = load_post_tags(conn, &meta.id.to_string())?;

    Ok(ForumPost {
        author_id: parse_uuid(&author_text, "forum_posts", "author_id")?,
        slug: row.get("slug")?,
        views: row.get("views")?,
        is_pinned: parse_bool(row.get("is_pinned")?, "forum_posts", "is_pinned")?,
        is_closed: parse_bool(row.get("is_closed")?, "forum_posts", "is_closed")?,
        fields: ForumPostFields {
            title: row.get("title")?,
            content: row.get("content")?,
            category_id: parse_optional_uuid(row.get("category_id")?, "forum_posts", "category_id")?,
            tags,
        },
        meta,
    })
}

fn parse_comment_row(row: &Row<'_>) -> RepoResult<Comment> {
    let post_text: String = row.get("post_id")?;
    let author_text: String = row.get("author_id")?;
    Ok(Comment {
        meta: parse_meta(row, "comments")?,
        post_id: parse_uuid(&post_text, "comments", "post_id")?,
        author_id: parse_uuid(&author_text, "comments", "author_id")?,
        parent_id: parse_optional_uuid(row.get("parent_id")?, "comments", "parent_id")?,
        content: row.get("content")?,
    })
}

fn parse_category_row(row: &Row<'_>) -> RepoResult<Category> {
    Ok(Category {
        meta: parse_meta(row, "categories")?,
        name: row.get("name")?,
        slug: row.get("slug")?,
        description: row.get("description")?,
        parent_id: parse_optional_uuid(row.get("parent_id")?, "categories", "parent_id")?,
    })
}
