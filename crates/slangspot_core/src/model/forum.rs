//! Forum domain model: posts, comments, categories and tags.
//!
//! # Responsibility
//! - Define forum entities and their form validation.
//! - Normalize tag input into a canonical list.
//!
//! # Invariants
//! - Tags are trimmed, lowercased and deduplicated in first-seen order.
//! - A post slug is assigned once at creation and never rewritten.

use crate::model::record::{RecordId, RecordMeta, UserId};
use crate::model::validation::{required_text, FormErrors, MSG_INVALID_CHOICE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

const TITLE_MAX_CHARS: usize = 200;
const COMMENT_MAX_CHARS: usize = 2000;
const CATEGORY_NAME_MAX_CHARS: usize = 100;
const TAG_MAX_CHARS: usize = 50;

/// Raw forum post form. `tags` is a comma-separated list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForumPostForm {
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub tags: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumPostFields {
    pub title: String,
    pub content: String,
    pub category_id: Option<RecordId>,
    pub tags: Vec<String>,
}

impl ForumPostForm {
    pub fn validate(&self) -> Result<ForumPostFields, FormErrors> {
        let mut errors = FormErrors::new();
        let title = required_text(&mut errors, "title", &self.title, Some(TITLE_MAX_CHARS));
        let content = required_text(&mut errors, "content", &self.content, None);
        let category_id = optional_uuid(&mut errors, "category", self.category.as_deref());
        let tags = normalize_tags(self.tags.as_deref().unwrap_or_default().split(','));
        if tags.iter().any(|tag| tag.chars().count() > TAG_MAX_CHARS) {
            errors.add(
                "tags",
                format!("Each tag must have at most {TAG_MAX_CHARS} characters."),
            );
        }

        errors.into_result(ForumPostFields {
            title,
            content,
            category_id,
            tags,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumPost {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub author_id: UserId,
    pub slug: String,
    pub views: i64,
    pub is_pinned: bool,
    pub is_closed: bool,
    #[serde(flatten)]
    pub fields: ForumPostFields,
}

impl ForumPost {
    pub fn new(author_id: UserId, slug: String, fields: ForumPostFields) -> Self {
        Self {
            meta: RecordMeta::new(),
            author_id,
            slug,
            views: 0,
            is_pinned: false,
            is_closed: false,
            fields,
        }
    }
}

/// Raw comment form. `parent` carries the replied-to comment id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentForm {
    pub content: String,
    pub parent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentFields {
    pub content: String,
    pub parent_id: Option<RecordId>,
}

impl CommentForm {
    pub fn validate(&self) -> Result<CommentFields, FormErrors> {
        let mut errors = FormErrors::new();
        let content = required_text(&mut errors, "content", &self.content, Some(COMMENT_MAX_CHARS));
        let parent_id = optional_uuid(&mut errors, "parent", self.parent.as_deref());
        errors.into_result(CommentFields { content, parent_id })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub post_id: RecordId,
    pub author_id: UserId,
    pub parent_id: Option<RecordId>,
    pub content: String,
}

impl Comment {
    pub fn new(post_id: RecordId, author_id: UserId, fields: CommentFields) -> Self {
        Self {
            meta: RecordMeta::new(),
            post_id,
            author_id,
            parent_id: fields.parent_id,
            content: fields.content,
        }
    }

    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryForm {
    pub name: String,
    pub description: Option<String>,
    pub parent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub parent_id: Option<RecordId>,
}

impl CategoryForm {
    /// Validates into a new category; the caller assigns the final slug.
    pub fn validate(&self) -> Result<Category, FormErrors> {
        let mut errors = FormErrors::new();
        let name = required_text(&mut errors, "name", &self.name, Some(CATEGORY_NAME_MAX_CHARS));
        let parent_id = optional_uuid(&mut errors, "parent", self.parent.as_deref());
        let description = self
            .description
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();

        errors.into_result(Category {
            meta: RecordMeta::new(),
            name,
            slug: String::new(),
            description,
            parent_id,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Moderator actions on a forum post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationAction {
    Pin,
    Unpin,
    Close,
    Reopen,
}

impl ModerationAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pin => "pin",
            Self::Unpin => "unpin",
            Self::Close => "close",
            Self::Reopen => "reopen",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "pin" => Some(Self::Pin),
            "unpin" => Some(Self::Unpin),
            "close" => Some(Self::Close),
            "reopen" | "open" => Some(Self::Reopen),
            _ => None,
        }
    }

    /// Applies the action to the post flags.
    pub fn apply(self, post: &mut ForumPost) {
        match self {
            Self::Pin => post.is_pinned = true,
            Self::Unpin => post.is_pinned = false,
            Self::Close => post.is_closed = true,
            Self::Reopen => post.is_closed = false,
        }
    }

    /// Past-tense verb used in moderation notifications.
    pub fn past_tense(self) -> &'static str {
        match self {
            Self::Pin => "pinned",
            Self::Unpin => "unpinned",
            Self::Close => "closed",
            Self::Reopen => "reopened",
        }
    }
}

/// Normalizes raw tag tokens: trim, lowercase, drop blanks and duplicates.
pub fn normalize_tags<'a>(raw: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut tags = Vec::new();
    for token in raw {
        let tag = token.trim().to_lowercase();
        if tag.is_empty() {
            continue;
        }
        if seen.insert(tag.clone()) {
            tags.push(tag);
        }
    }
    tags
}

fn optional_uuid(errors: &mut FormErrors, field: &str, value: Option<&str>) -> Option<Uuid> {
    let raw = value.map(str::trim).filter(|raw| !raw.is_empty())?;
    match Uuid::parse_str(raw) {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(field, MSG_INVALID_CHOICE);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_tags, CommentForm, ForumPost, ForumPostForm, ModerationAction};
    use uuid::Uuid;

    #[test]
    fn tags_are_lowercased_and_deduplicated() {
        let tags = normalize_tags(" Slang, mexico,SLANG,, modismos ".split(','));
        assert_eq!(tags, vec!["slang", "mexico", "modismos"]);
    }

    #[test]
    fn post_form_requires_title_and_content() {
        let errors = ForumPostForm::default().validate().expect_err("empty post");
        assert!(errors.contains("title"));
        assert!(errors.contains("content"));
    }

    #[test]
    fn post_form_rejects_malformed_category() {
        let form = ForumPostForm {
            title: "Hola".to_string(),
            content: "¿Qué onda?".to_string(),
            category: Some("not-a-uuid".to_string()),
            tags: None,
        };
        assert!(form.validate().unwrap_err().contains("category"));
    }

    #[test]
    fn comment_form_limits_length() {
        let form = CommentForm {
            content: "a".repeat(2001),
            parent: None,
        };
        assert!(form.validate().unwrap_err().contains("content"));
    }

    #[test]
    fn moderation_actions_toggle_flags() {
        let fields = ForumPostForm {
            title: "t".to_string(),
            content: "c".to_string(),
            ..ForumPostForm::default()
        }
        .validate()
        .unwrap();
        let mut post = ForumPost::new(Uuid::new_v4(), "t".to_string(), fields);

        ModerationAction::Pin.apply(&mut post);
        ModerationAction::Close.apply(&mut post);
        assert!(post.is_pinned && post.is_closed);

        ModerationAction::parse("reopen").unwrap().apply(&mut post);
        assert!(!post.is_closed);
        assert_eq!(ModerationAction::parse("delete"), None);
    }
}
