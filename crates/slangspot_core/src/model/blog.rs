//! Blog article model.

use crate::model::record::{RecordMeta, UserId};
use crate::model::validation::{
    checkbox, optional_file_path, optional_text, required_text, FormErrors, IMAGE_EXTENSIONS,
};
use serde::{Deserialize, Serialize};

const TITLE_MAX_CHARS: usize = 200;
const EXCERPT_MAX_CHARS: usize = 500;
const CATEGORY_MAX_CHARS: usize = 100;

/// Raw blog form. `is_published` is an HTML checkbox value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogPostForm {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub category: Option<String>,
    pub featured_image: Option<String>,
    pub is_published: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPostFields {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub category: String,
    pub featured_image: Option<String>,
    pub is_published: bool,
}

impl BlogPostForm {
    pub fn validate(&self) -> Result<BlogPostFields, FormErrors> {
        let mut errors = FormErrors::new();
        let title = required_text(&mut errors, "title", &self.title, Some(TITLE_MAX_CHARS));
        let content = required_text(&mut errors, "content", &self.content, None);
        let excerpt = optional_text(
            &mut errors,
            "excerpt",
            self.excerpt.as_deref(),
            Some(EXCERPT_MAX_CHARS),
        )
        .unwrap_or_default();
        let category = optional_text(
            &mut errors,
            "category",
            self.category.as_deref(),
            Some(CATEGORY_MAX_CHARS),
        )
        .unwrap_or_default();
        let featured_image = optional_file_path(
            &mut errors,
            "featured_image",
            self.featured_image.as_deref(),
            IMAGE_EXTENSIONS,
        );

        errors.into_result(BlogPostFields {
            title,
            content,
            excerpt,
            category,
            featured_image,
            is_published: checkbox(self.is_published.as_deref()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub author_id: UserId,
    pub slug: String,
    pub views: i64,
    #[serde(flatten)]
    pub fields: BlogPostFields,
}

impl BlogPost {
    pub fn new(author_id: UserId, slug: String, fields: BlogPostFields) -> Self {
        Self {
            meta: RecordMeta::new(),
            author_id,
            slug,
            views: 0,
            fields,
        }
    }

    /// Visible on the public list and detail pages.
    pub fn is_visible(&self) -> bool {
        self.meta.is_active() && self.fields.is_published
    }
}

#[cfg(test)]
mod tests {
    use super::BlogPostForm;

    #[test]
    fn unchecked_publish_box_means_draft() {
        let form = BlogPostForm {
            title: "Modismos".to_string(),
            content: "Texto".to_string(),
            ..BlogPostForm::default()
        };
        let fields = form.validate().unwrap();
        assert!(!fields.is_published);
        assert_eq!(fields.excerpt, "");
    }

    #[test]
    fn featured_image_must_be_an_image() {
        let form = BlogPostForm {
            title: "Modismos".to_string(),
            content: "Texto".to_string(),
            featured_image: Some("song.mp3".to_string()),
            is_published: Some("on".to_string()),
            ..BlogPostForm::default()
        };
        assert!(form.validate().unwrap_err().contains("featured_image"));
    }
}
