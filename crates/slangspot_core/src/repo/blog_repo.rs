//! Blog post repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Public reads (`list_published`, `get_published_by_slug`, `related`) only
//!   return active, published posts.

use crate::model::blog::{BlogPost, BlogPostFields};
use crate::model::record::{LikeOutcome, RecordId, UserId};
use crate::repo::common::{
    bool_to_int, count_likes, has_liked, meta_columns, parse_bool, parse_meta, parse_uuid,
    soft_delete_row, toggle_like, LikeTable, RecordTable, RepoError, RepoResult,
};
use crate::search::BlogFilter;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

pub trait BlogRepository {
    fn create_blog_post(&self, post: &BlogPost) -> RepoResult<RecordId>;
    fn update_blog_post(&self, post: &BlogPost) -> RepoResult<()>;
    fn get_blog_post(&self, id: RecordId, include_deleted: bool) -> RepoResult<Option<BlogPost>>;
    fn get_published_by_slug(&self, slug: &str) -> RepoResult<Option<BlogPost>>;
    fn list_published(&self, filter: &BlogFilter) -> RepoResult<Vec<BlogPost>>;
    /// Other published posts of the same category, newest first.
    fn related_posts(&self, post: &BlogPost, limit: u32) -> RepoResult<Vec<BlogPost>>;
    fn blog_slug_exists(&self, slug: &str) -> RepoResult<bool>;
    fn increment_blog_views(&self, id: RecordId) -> RepoResult<()>;
    fn soft_delete_blog_post(&self, id: RecordId) -> RepoResult<()>;
    fn toggle_blog_like(&self, post_id: RecordId, user_id: UserId) -> RepoResult<LikeOutcome>;
    fn blog_like_count(&self, post_id: RecordId) -> RepoResult<u32>;
    fn has_liked_blog_post(&self, post_id: RecordId, user_id: UserId) -> RepoResult<bool>;
}

pub struct SqliteBlogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBlogRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_blog_posts(
        &self,
        sql: &str,
        bind_values: impl rusqlite::Params,
    ) -> RepoResult<Vec<BlogPost>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(bind_values)?;
        let mut posts = Vec::new();
        while let Some(row) = rows.next()? {
            posts.push(parse_blog_row(row)?);
        }
        Ok(posts)
    }
}

fn blog_select() -> String {
    format!(
        "SELECT {meta},
            b.author_id AS author_id,
            b.title AS title,
            b.slug AS slug,
            b.content AS content,
            b.excerpt AS excerpt,
            b.category AS category,
            b.featured_image AS featured_image,
            b.is_published AS is_published,
            b.views AS views
         FROM blog_posts b",
        meta = meta_columns("b")
    )
}

impl BlogRepository for SqliteBlogRepository<'_> {
    fn create_blog_post(&self, post: &BlogPost) -> RepoResult<RecordId> {
        let fields = &post.fields;
        self.conn.execute(
            "INSERT INTO blog_posts (
                id,
                author_id,
                title,
                slug,
                content,
                excerpt,
                category,
                featured_image,
                is_published,
                views,
                created_at,
                updated_at,
                status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 'active');",
            params![
                post.meta.id.to_string(),
                post.author_id.to_string(),
                fields.title.as_str(),
                post.slug.as_str(),
                fields.content.as_str(),
                fields.excerpt.as_str(),
                fields.category.as_str(),
                fields.featured_image.as_deref(),
                bool_to_int(fields.is_published),
                post.views,
                post.meta.created_at,
                post.meta.updated_at,
            ],
        )?;
        Ok(post.meta.id)
    }

    fn update_blog_post(&self, post: &BlogPost) -> RepoResult<()> {
        let fields = &post.fields;
        let changed = self.conn.execute(
            "UPDATE blog_posts
             SET
                title = ?2,
                content = ?3,
                excerpt = ?4,
                category = ?5,
                featured_image = ?6,
                is_published = ?7,
                updated_at = ?8
             WHERE id = ?1
               AND status = 'active';",
            params![
                post.meta.id.to_string(),
                fields.title.as_str(),
                fields.content.as_str(),
                fields.excerpt.as_str(),
                fields.category.as_str(),
                fields.featured_image.as_deref(),
                bool_to_int(fields.is_published),
                post.meta.updated_at,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(post.meta.id));
        }
        Ok(())
    }

    fn get_blog_post(&self, id: RecordId, include_deleted: bool) -> RepoResult<Option<BlogPost>> {
        let mut sql = blog_select();
        sql.push_str(" WHERE b.id = ?1");
        if !include_deleted {
            sql.push_str(" AND b.status = 'active'");
        }
        Ok(self.query_blog_posts(&sql, [id.to_string()])?.into_iter().next())
    }

    fn get_published_by_slug(&self, slug: &str) -> RepoResult<Option<BlogPost>> {
        let sql = format!(
            "{} WHERE b.slug = ?1 AND b.is_published = 1 AND b.status = 'active'",
            blog_select()
        );
        Ok(self.query_blog_posts(&sql, [slug])?.into_iter().next())
    }

    fn list_published(&self, filter: &BlogFilter) -> RepoResult<Vec<BlogPost>> {
        let select = format!("{} WHERE b.status = 'active'", blog_select());
        let (sql, bind_values) = filter.compose(&select).into_parts();
        self.query_blog_posts(&sql, params_from_iter(bind_values))
    }

    fn related_posts(&self, post: &BlogPost, limit: u32) -> RepoResult<Vec<BlogPost>> {
        let sql = format!(
            "{}
             WHERE b.category = ?1
               AND b.id <> ?2
               AND b.is_published = 1
               AND b.status = 'active'
             ORDER BY b.created_at DESC, b.rowid DESC
             LIMIT ?3;",
            blog_select()
        );
        self.query_blog_posts(
            &sql,
            params![
                post.fields.category.as_str(),
                post.meta.id.to_string(),
                i64::from(limit)
            ],
        )
    }

    fn blog_slug_exists(&self, slug: &str) -> RepoResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM blog_posts WHERE slug = ?1;", [slug], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(found.is_some())
    }

    fn increment_blog_views(&self, id: RecordId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE blog_posts SET views = views + 1 WHERE id = ?1 AND status = 'active';",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn soft_delete_blog_post(&self, id: RecordId) -> RepoResult<()> {
        soft_delete_row(self.conn, RecordTable::BlogPosts, id)
    }

    fn toggle_blog_like(&self, post_id: RecordId, user_id: UserId) -> RepoResult<LikeOutcome> {
        toggle_like(self.conn, LikeTable::BlogPosts, post_id, user_id)
    }

    fn blog_like_count(&self, post_id: RecordId) -> RepoResult<u32> {
        count_likes(self.conn, LikeTable::BlogPosts, post_id)
    }

    fn has_liked_blog_post(&self, post_id: RecordId, user_id: UserId) -> RepoResult<bool> {
        has_liked(self.conn, LikeTable::BlogPosts, post_id, user_id)
    }
}

fn parse_blog_row(row: &Row<'_>) -> RepoResult<BlogPost> {
    let author_text: String = row.get("author_id")?;
    Ok(BlogPost {
        meta: parse_meta(row, "blog_posts")?,
        author_id: parse_uuid(&author_text, "blog_posts", "author_id")?,
        slug: row.get("slug")?,
        views: row.get("views")?,
        fields: BlogPostFields {
            title: row.get("title")?,
            content: row.get("content")?,
            excerpt: row.get("excerpt")?,
            category: row.get("category")?,
            featured_image: row.get("featured_image")?,
            is_published: parse_bool(row.get("is_published")?, "blog_posts", "is_published")?,
        },
    })
}
