//! Blog use-cases.
//!
//! # Invariants
//! - Public pages only show active, published posts.
//! - Edit and delete require ownership (or superuser).

use crate::model::blog::{BlogPost, BlogPostForm};
use crate::model::record::{EntityKind, LikeOutcome, RecordId};
use crate::model::slug::slugify;
use crate::model::user::User;
use crate::permission::{can_delete, can_edit, Capability};
use crate::repo::blog_repo::BlogRepository;
use crate::search::{BlogFilter, SearchParams};
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::outcome::{RedirectTarget, Saved};
use crate::service::{free_slug, log_soft_delete};
use serde::Serialize;

pub const RELATED_POSTS_LIMIT: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlogDetail {
    pub post: BlogPost,
    pub likes_count: u32,
    pub liked: bool,
    pub can_edit: bool,
    pub related: Vec<BlogPost>,
}

pub struct BlogService<B: BlogRepository> {
    repo: B,
}

impl<B: BlogRepository> BlogService<B> {
    pub fn new(repo: B) -> Self {
        Self { repo }
    }

    pub fn list_published(&self, params: &SearchParams) -> ServiceResult<Vec<BlogPost>> {
        Ok(self.repo.list_published(&BlogFilter::from_params(params))?)
    }

    /// Loads a published post by slug and counts one view.
    pub fn blog_detail(&self, viewer: Option<&User>, slug: &str) -> ServiceResult<BlogDetail> {
        let post = self.published(slug)?;
        self.repo.increment_blog_views(post.meta.id)?;
        let post = self.published(slug)?;

        let liked = match viewer {
            Some(viewer) => self.repo.has_liked_blog_post(post.meta.id, viewer.id)?,
            None => false,
        };
        Ok(BlogDetail {
            likes_count: self.repo.blog_like_count(post.meta.id)?,
            liked,
            can_edit: viewer.is_some_and(|viewer| can_edit(viewer, &post)),
            related: self.repo.related_posts(&post, RELATED_POSTS_LIMIT)?,
            post,
        })
    }

    pub fn create_post(&self, actor: &User, form: &BlogPostForm) -> ServiceResult<Saved<BlogPost>> {
        let fields = form.validate()?;
        let slug = free_slug(&slugify(&fields.title), "article", |candidate| {
            self.repo.blog_slug_exists(candidate)
        })?;
        let post = BlogPost::new(actor.id, slug, fields);
        let id = self.repo.create_blog_post(&post)?;
        let stored = self
            .repo
            .get_blog_post(id, false)?
            .ok_or(ServiceError::InconsistentState(
                "created blog post not found in read-back",
            ))?;
        Ok(Saved::new(stored, RedirectTarget::BlogList))
    }

    pub fn update_post(
        &self,
        actor: &User,
        id: RecordId,
        form: &BlogPostForm,
    ) -> ServiceResult<Saved<BlogPost>> {
        let mut post = self.active(id)?;
        if !can_edit(actor, &post) {
            return Err(ServiceError::forbidden(Capability::Edit, EntityKind::BlogPost));
        }
        post.fields = form.validate()?;
        post.meta.touch();
        self.repo.update_blog_post(&post)?;
        let redirect = if post.fields.is_published {
            RedirectTarget::BlogDetail(post.slug.clone())
        } else {
            RedirectTarget::BlogList
        };
        Ok(Saved::new(post, redirect))
    }

    pub fn delete_post(&self, actor: &User, id: RecordId) -> ServiceResult<RedirectTarget> {
        let post = self.active(id)?;
        if !can_delete(actor, &post) {
            return Err(ServiceError::forbidden(Capability::Delete, EntityKind::BlogPost));
        }
        self.repo.soft_delete_blog_post(id)?;
        log_soft_delete(EntityKind::BlogPost, id);
        Ok(RedirectTarget::BlogList)
    }

    /// Likes or unlikes a published post.
    pub fn toggle_like(&self, actor: &User, slug: &str) -> ServiceResult<LikeOutcome> {
        let post = self.published(slug)?;
        Ok(self.repo.toggle_blog_like(post.meta.id, actor.id)?)
    }

    fn published(&self, slug: &str) -> ServiceResult<BlogPost> {
        self.repo
            .get_published_by_slug(slug)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::BlogPost, slug))
    }

    fn active(&self, id: RecordId) -> ServiceResult<BlogPost> {
        self.repo
            .get_blog_post(id, false)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::BlogPost, id))
    }
}
