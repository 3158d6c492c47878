//! Forum use-cases: posts, comments, likes, moderation and categories.
//!
//! # Responsibility
//! - Orchestrate forum reads and mutations with permission checks.
//! - Trigger notification fan-out for likes, comments, replies, mentions and
//!   moderation actions.
//!
//! # Invariants
//! - Closed posts reject new comments.
//! - A reply's parent must be an active comment of the same post.
//! - One comment notifies each recipient at most once.
//! - A comment and its notification rows commit together or not at all.

use crate::model::forum::{
    Category, CategoryForm, Comment, CommentForm, ForumPost, ForumPostForm, ModerationAction, Tag,
};
use crate::model::record::{now_epoch_ms, EntityKind, LikeOutcome, RecordId, UserId};
use crate::model::slug::slugify;
use crate::model::user::User;
use crate::model::validation::{FormErrors, MSG_INVALID_CHOICE};
use crate::permission::{can_delete, can_edit, can_moderate, Capability};
use crate::repo::forum_repo::{ForumRepository, PopularPost, PostStats};
use crate::repo::notification_repo::NotificationRepository;
use crate::repo::user_repo::UserRepository;
use crate::search::{PostFilter, SearchParams};
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::notification_service::{extract_mentions, NotificationService};
use crate::service::outcome::{RedirectTarget, Saved};
use crate::service::{free_slug, log_soft_delete};
use log::info;
use serde::Serialize;
use std::collections::BTreeSet;

pub const POPULAR_POSTS_DEFAULT_DAYS: u32 = 30;
pub const POPULAR_POSTS_LIMIT: u32 = 10;
const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Forum list entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostSummary {
    #[serde(flatten)]
    pub post: ForumPost,
    #[serde(flatten)]
    pub stats: PostStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub likes_count: u32,
}

/// Top-level comment with its active replies (oldest first).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: CommentView,
    pub replies: Vec<CommentView>,
}

/// Post detail page model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostDetail {
    pub post: ForumPost,
    pub category: Option<Category>,
    #[serde(flatten)]
    pub stats: PostStats,
    /// Whether the viewer currently likes the post.
    pub liked: bool,
    pub can_edit: bool,
    pub can_moderate: bool,
    /// Top-level comments, newest first.
    pub comments: Vec<CommentThread>,
}

pub struct ForumService<'p, F, U, N>
where
    F: ForumRepository,
    U: UserRepository,
    N: NotificationRepository,
{
    forum: F,
    users: U,
    notifier: NotificationService<'p, N>,
}

impl<'p, F, U, N> ForumService<'p, F, U, N>
where
    F: ForumRepository,
    U: UserRepository,
    N: NotificationRepository,
{
    pub fn new(forum: F, users: U, notifier: NotificationService<'p, N>) -> Self {
        Self {
            forum,
            users,
            notifier,
        }
    }

    pub fn list_posts(&self, params: &SearchParams) -> ServiceResult<Vec<PostSummary>> {
        let posts = self.forum.list_posts(&PostFilter::from_params(params))?;
        posts
            .into_iter()
            .map(|post| {
                let stats = self.forum.post_stats(post.meta.id)?;
                Ok(PostSummary { post, stats })
            })
            .collect()
    }

    /// Loads the detail page and counts one view.
    pub fn post_detail(&self, viewer: &User, id: RecordId) -> ServiceResult<PostDetail> {
        self.active_post(id)?;
        self.forum.increment_post_views(id)?;
        let post = self.active_post(id)?;

        let category = match post.fields.category_id {
            Some(category_id) => self.forum.get_category(category_id)?,
            None => None,
        };
        let mut comments = Vec::new();
        for comment in self.forum.list_top_level_comments(id)? {
            let replies = self
                .forum
                .list_replies(comment.meta.id)?
                .into_iter()
                .map(|reply| self.comment_view(reply))
                .collect::<ServiceResult<Vec<_>>>()?;
            comments.push(CommentThread {
                comment: self.comment_view(comment)?,
                replies,
            });
        }

        Ok(PostDetail {
            stats: self.forum.post_stats(id)?,
            liked: self.forum.has_liked_post(id, viewer.id)?,
            can_edit: can_edit(viewer, &post),
            can_moderate: can_moderate(viewer),
            category,
            comments,
            post,
        })
    }

    pub fn create_post(&self, actor: &User, form: &ForumPostForm) -> ServiceResult<Saved<ForumPost>> {
        let fields = form.validate()?;
        self.check_category(fields.category_id)?;
        let slug = free_slug(&slugify(&fields.title), "post", |candidate| {
            self.forum.post_slug_exists(candidate)
        })?;
        let post = ForumPost::new(actor.id, slug, fields);
        let id = self.forum.create_post(&post)?;
        let stored = self
            .forum
            .get_post(id, false)?
            .ok_or(ServiceError::InconsistentState(
                "created post not found in read-back",
            ))?;
        Ok(Saved::new(stored, RedirectTarget::ForumIndex))
    }

    pub fn update_post(
        &self,
        actor: &User,
        id: RecordId,
        form: &ForumPostForm,
    ) -> ServiceResult<Saved<ForumPost>> {
        let mut post = self.active_post(id)?;
        if !can_edit(actor, &post) {
            return Err(ServiceError::forbidden(Capability::Edit, EntityKind::ForumPost));
        }
        let fields = form.validate()?;
        self.check_category(fields.category_id)?;
        post.fields = fields;
        post.meta.touch();
        self.forum.update_post(&post)?;
        let stored = self
            .forum
            .get_post(id, false)?
            .ok_or(ServiceError::InconsistentState(
                "updated post not found in read-back",
            ))?;
        Ok(Saved::new(stored, RedirectTarget::PostDetail(id)))
    }

    pub fn delete_post(&self, actor: &User, id: RecordId) -> ServiceResult<RedirectTarget> {
        let post = self.active_post(id)?;
        if !can_delete(actor, &post) {
            return Err(ServiceError::forbidden(Capability::Delete, EntityKind::ForumPost));
        }
        self.forum.soft_delete_post(id)?;
        log_soft_delete(EntityKind::ForumPost, id);
        Ok(RedirectTarget::ForumIndex)
    }

    /// Likes or unlikes a post; only a new like notifies the author.
    pub fn toggle_post_like(&self, actor: &User, id: RecordId) -> ServiceResult<LikeOutcome> {
        let post = self.active_post(id)?;
        let outcome = self.forum.toggle_post_like(id, actor.id)?;
        if outcome.liked {
            self.notifier.notify_post_like(actor, &post)?;
        }
        Ok(outcome)
    }

    pub fn add_comment(
        &self,
        actor: &User,
        post_id: RecordId,
        form: &CommentForm,
    ) -> ServiceResult<Saved<Comment>> {
        let post = self.active_post(post_id)?;
        if post.is_closed {
            return Err(ServiceError::Forbidden {
                message: "This post is closed to new comments.".to_string(),
            });
        }
        let fields = form.validate()?;
        let parent = match fields.parent_id {
            Some(parent_id) => Some(self.reply_parent(post_id, parent_id)?),
            None => None,
        };

        let comment = Comment::new(post_id, actor.id, fields);
        self.forum.in_transaction(|| {
            self.forum.create_comment(&comment)?;
            self.fan_out_comment(actor, &post, parent.as_ref(), &comment)
        })?;

        Ok(Saved::new(comment, RedirectTarget::PostDetail(post_id)))
    }

    pub fn update_comment(
        &self,
        actor: &User,
        id: RecordId,
        form: &CommentForm,
    ) -> ServiceResult<Saved<Comment>> {
        let mut comment = self.active_comment(id)?;
        if !can_edit(actor, &comment) {
            return Err(ServiceError::forbidden(Capability::Edit, EntityKind::Comment));
        }
        comment.content = form.validate()?.content;
        comment.meta.touch();
        self.forum.update_comment(&comment)?;
        let post_id = comment.post_id;
        Ok(Saved::new(comment, RedirectTarget::PostDetail(post_id)))
    }

    pub fn delete_comment(&self, actor: &User, id: RecordId) -> ServiceResult<RedirectTarget> {
        let comment = self.active_comment(id)?;
        if !can_delete(actor, &comment) {
            return Err(ServiceError::forbidden(Capability::Delete, EntityKind::Comment));
        }
        self.forum.soft_delete_comment(id)?;
        log_soft_delete(EntityKind::Comment, id);
        Ok(RedirectTarget::PostDetail(comment.post_id))
    }

    pub fn toggle_comment_like(&self, actor: &User, id: RecordId) -> ServiceResult<LikeOutcome> {
        let comment = self.active_comment(id)?;
        let outcome = self.forum.toggle_comment_like(id, actor.id)?;
        if outcome.liked {
            self.notifier.notify_comment_like(actor, &comment)?;
        }
        Ok(outcome)
    }

    /// Pins, unpins, closes or reopens a post. Moderators only.
    pub fn moderate_post(
        &self,
        actor: &User,
        id: RecordId,
        action: ModerationAction,
    ) -> ServiceResult<Saved<ForumPost>> {
        let mut post = self.active_post(id)?;
        if !can_moderate(actor) {
            return Err(ServiceError::Forbidden {
                message: "You do not have permission to moderate this post.".to_string(),
            });
        }
        action.apply(&mut post);
        post.meta.touch();
        self.forum.update_post(&post)?;
        info!(
            "event=post_moderate module=service status=ok action={} post_id={}",
            action.as_str(),
            id
        );
        self.notifier.notify_moderation(actor, &post, action)?;
        Ok(Saved::new(post, RedirectTarget::PostDetail(id)))
    }

    pub fn list_categories(&self) -> ServiceResult<Vec<Category>> {
        Ok(self.forum.list_categories()?)
    }

    pub fn create_category(
        &self,
        actor: &User,
        form: &CategoryForm,
    ) -> ServiceResult<Saved<Category>> {
        if !can_moderate(actor) {
            return Err(ServiceError::Forbidden {
                message: "You do not have permission to create categories.".to_string(),
            });
        }
        let mut category = form.validate()?;
        if let Some(parent_id) = category.parent_id {
            if self.forum.get_category(parent_id)?.is_none() {
                return Err(FormErrors::single("parent", MSG_INVALID_CHOICE).into());
            }
        }
        category.slug = free_slug(&slugify(&category.name), "category", |candidate| {
            self.forum.category_slug_exists(candidate)
        })?;
        self.forum.create_category(&category)?;
        Ok(Saved::new(category, RedirectTarget::ForumCategories))
    }

    pub fn list_tags(&self) -> ServiceResult<Vec<Tag>> {
        Ok(self.forum.list_tags()?)
    }

    /// Top posts by likes plus comments among posts from the last `days`.
    pub fn popular_posts(&self, days: Option<u32>) -> ServiceResult<Vec<PopularPost>> {
        let days = days.filter(|days| *days > 0).unwrap_or(POPULAR_POSTS_DEFAULT_DAYS);
        let since = now_epoch_ms() - i64::from(days) * DAY_MS;
        Ok(self.forum.popular_posts(since, POPULAR_POSTS_LIMIT)?)
    }

    fn fan_out_comment(
        &self,
        actor: &User,
        post: &ForumPost,
        parent: Option<&Comment>,
        comment: &Comment,
    ) -> ServiceResult<()> {
        let mut notified: BTreeSet<UserId> = BTreeSet::new();
        notified.insert(actor.id);

        if let Some(parent) = parent {
            if notified.insert(parent.author_id) {
                self.notifier.notify_reply(actor, parent, comment)?;
            }
        }
        if notified.insert(post.author_id) {
            self.notifier.notify_new_comment(actor, post, comment)?;
        }
        for username in extract_mentions(&comment.content) {
            let Some(mentioned) = self.users.find_by_username(&username)? else {
                continue;
            };
            if notified.insert(mentioned.id) {
                self.notifier
                    .notify_mention(actor, &mentioned, post, Some(comment))?;
            }
        }
        Ok(())
    }

    fn reply_parent(&self, post_id: RecordId, parent_id: RecordId) -> ServiceResult<Comment> {
        match self.forum.get_comment(parent_id, false)? {
            Some(parent) if parent.post_id == post_id => Ok(parent),
            _ => Err(FormErrors::single("parent", "Reply target is not a comment of this post.").into()),
        }
    }

    fn check_category(&self, category_id: Option<RecordId>) -> ServiceResult<()> {
        if let Some(category_id) = category_id {
            if self.forum.get_category(category_id)?.is_none() {
                return Err(FormErrors::single("category", MSG_INVALID_CHOICE).into());
            }
        }
        Ok(())
    }

    fn comment_view(&self, comment: Comment) -> ServiceResult<CommentView> {
        let likes_count = self.forum.comment_like_count(comment.meta.id)?;
        Ok(CommentView {
            comment,
            likes_count,
        })
    }

    fn active_post(&self, id: RecordId) -> ServiceResult<ForumPost> {
        self.forum
            .get_post(id, false)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::ForumPost, id))
    }

    fn active_comment(&self, id: RecordId) -> ServiceResult<Comment> {
        self.forum
            .get_comment(id, false)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Comment, id))
    }
}
