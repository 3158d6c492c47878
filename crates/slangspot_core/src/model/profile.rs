//! User profile model (one profile per user).
//!
//! # Invariants
//! - `user_id` is unique across profiles.
//! - `preferred_language` is never blank.

use crate::model::record::{RecordMeta, UserId};
use crate::model::validation::{
    optional_file_path, optional_text, required_text, FormErrors, IMAGE_EXTENSIONS,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LANGUAGE: &str = "es";

const BIO_MAX_CHARS: usize = 500;
const LOCATION_MAX_CHARS: usize = 100;
const LANGUAGE_MAX_CHARS: usize = 10;
const WEBSITE_MAX_CHARS: usize = 200;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub bio: Option<String>,
    pub preferred_language: String,
    pub learning_goals: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileFields {
    pub bio: String,
    pub preferred_language: String,
    pub learning_goals: String,
    pub website: String,
    pub location: String,
    pub avatar: Option<String>,
}

impl Default for ProfileFields {
    fn default() -> Self {
        Self {
            bio: String::new(),
            preferred_language: DEFAULT_LANGUAGE.to_string(),
            learning_goals: String::new(),
            website: String::new(),
            location: String::new(),
            avatar: None,
        }
    }
}

impl ProfileForm {
    pub fn validate(&self) -> Result<ProfileFields, FormErrors> {
        let mut errors = FormErrors::new();
        let bio = optional_text(&mut errors, "bio", self.bio.as_deref(), Some(BIO_MAX_CHARS));
        let preferred_language = required_text(
            &mut errors,
            "preferred_language",
            &self.preferred_language,
            Some(LANGUAGE_MAX_CHARS),
        );
        let learning_goals =
            optional_text(&mut errors, "learning_goals", self.learning_goals.as_deref(), None);
        let website = optional_text(
            &mut errors,
            "website",
            self.website.as_deref(),
            Some(WEBSITE_MAX_CHARS),
        );
        if let Some(url) = website.as_deref() {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                errors.add("website", "Enter a valid URL.");
            }
        }
        let location = optional_text(
            &mut errors,
            "location",
            self.location.as_deref(),
            Some(LOCATION_MAX_CHARS),
        );
        let avatar =
            optional_file_path(&mut errors, "avatar", self.avatar.as_deref(), IMAGE_EXTENSIONS);

        errors.into_result(ProfileFields {
            bio: bio.unwrap_or_default(),
            preferred_language,
            learning_goals: learning_goals.unwrap_or_default(),
            website: website.unwrap_or_default(),
            location: location.unwrap_or_default(),
            avatar,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub user_id: UserId,
    pub reputation: i64,
    #[serde(flatten)]
    pub fields: ProfileFields,
}

impl UserProfile {
    /// Blank profile with default language and zero reputation.
    pub fn new(user_id: UserId) -> Self {
        Self {
            meta: RecordMeta::new(),
            user_id,
            reputation: 0,
            fields: ProfileFields::default(),
        }
    }
}
