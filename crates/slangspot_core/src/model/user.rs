//! User accounts acting on content.
//!
//! Authentication is handled outside core; this model only carries the
//! identity and role flags permission checks need.

use crate::model::record::{now_epoch_ms, UserId};
use crate::model::validation::{FormErrors, MSG_REQUIRED};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const USERNAME_MAX_CHARS: usize = 150;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("valid username regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    /// Superusers pass every ownership check.
    pub is_superuser: bool,
    /// Staff may moderate forum content.
    pub is_staff: bool,
    pub created_at: i64,
}

impl User {
    /// Creates a regular account with a generated id.
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            is_superuser: false,
            is_staff: false,
            created_at: now_epoch_ms(),
        }
    }

    /// Checks username shape before persistence.
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        let username = self.username.trim();
        if username.is_empty() {
            errors.add("username", MSG_REQUIRED);
        } else if username.chars().count() > USERNAME_MAX_CHARS
            || !USERNAME_RE.is_match(username)
        {
            errors.add(
                "username",
                "Enter a valid username of at most 150 letters, digits and @/./+/-/_ characters.",
            );
        }
        if !self.email.is_empty() && !self.email.contains('@') {
            errors.add("email", "Enter a valid email address.");
        }
        errors.into_result(())
    }
}

#[cfg(test)]
mod tests {
    use super::User;

    #[test]
    fn new_user_has_no_elevated_roles() {
        let user = User::new("ana", "ana@example.com");
        assert!(!user.is_superuser);
        assert!(!user.is_staff);
        assert!(user.validate().is_ok());
    }

    #[test]
    fn validate_rejects_spaces_in_username() {
        let user = User::new("ana maria", "");
        let errors = user.validate().expect_err("spaces are not allowed");
        assert!(errors.contains("username"));
    }

    #[test]
    fn validate_rejects_malformed_email() {
        let user = User::new("ana", "not-an-email");
        let errors = user.validate().expect_err("email must contain @");
        assert!(errors.contains("email"));
    }
}
