//! Ownership-based permission predicates.
//!
//! # Responsibility
//! - Decide whether an actor may edit or delete a resource.
//! - Decide whether an actor may moderate forum content.
//!
//! # Invariants
//! - Superusers pass every check.
//! - Otherwise only the recorded owner passes; ownership is a direct field
//!   or one hop through the parent lesson.
//! - A resource without a resolvable owner is only editable by superusers.

use crate::model::blog::BlogPost;
use crate::model::forum::{Comment, ForumPost};
use crate::model::lesson::{Expression, Lesson};
use crate::model::practice::Practice;
use crate::model::profile::UserProfile;
use crate::model::record::{EntityKind, UserId};
use crate::model::user::User;

/// A resource with an (optional) owning user.
pub trait Owned {
    fn owner_id(&self) -> Option<UserId>;
    fn kind(&self) -> EntityKind;
}

impl Owned for Lesson {
    fn owner_id(&self) -> Option<UserId> {
        Some(self.author_id)
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Lesson
    }
}

impl Owned for ForumPost {
    fn owner_id(&self) -> Option<UserId> {
        Some(self.author_id)
    }

    fn kind(&self) -> EntityKind {
        EntityKind::ForumPost
    }
}

impl Owned for Comment {
    fn owner_id(&self) -> Option<UserId> {
        Some(self.author_id)
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Comment
    }
}

impl Owned for BlogPost {
    fn owner_id(&self) -> Option<UserId> {
        Some(self.author_id)
    }

    fn kind(&self) -> EntityKind {
        EntityKind::BlogPost
    }
}

impl Owned for Practice {
    fn owner_id(&self) -> Option<UserId> {
        Some(self.user_id)
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Practice
    }
}

impl Owned for UserProfile {
    fn owner_id(&self) -> Option<UserId> {
        Some(self.user_id)
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Profile
    }
}

/// An expression viewed through its parent lesson.
pub struct ExpressionOwnership<'a> {
    pub expression: &'a Expression,
    pub lesson: Option<&'a Lesson>,
}

impl Owned for ExpressionOwnership<'_> {
    fn owner_id(&self) -> Option<UserId> {
        match (self.expression.lesson_id, self.lesson) {
            (Some(lesson_id), Some(lesson)) if lesson.meta.id == lesson_id => {
                Some(lesson.author_id)
            }
            _ => None,
        }
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Expression
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Edit,
    Delete,
}

impl Capability {
    fn verb(self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Delete => "delete",
        }
    }
}

pub fn is_owner(actor: &User, resource: &impl Owned) -> bool {
    resource.owner_id() == Some(actor.id)
}

/// Edit and delete share one rule; [`Capability`] only selects the wording
/// of [`denial_message`].
pub fn owner_or_superuser(actor: &User, resource: &impl Owned) -> bool {
    actor.is_superuser || is_owner(actor, resource)
}

pub fn can_edit(actor: &User, resource: &impl Owned) -> bool {
    owner_or_superuser(actor, resource)
}

pub fn can_delete(actor: &User, resource: &impl Owned) -> bool {
    owner_or_superuser(actor, resource)
}

/// Pin/close posts and manage categories.
pub fn can_moderate(actor: &User) -> bool {
    actor.is_superuser || actor.is_staff
}

/// User-facing message for a denied action.
pub fn denial_message(capability: Capability, kind: EntityKind) -> String {
    format!(
        "You do not have permission to {} this {}.",
        capability.verb(),
        kind.label()
    )
}

#[cfg(test)]
mod tests {
    use super::{
        can_delete, can_edit, can_moderate, denial_message, owner_or_superuser, Capability,
        ExpressionOwnership,
    };
    use crate::model::lesson::{Expression, ExpressionFields, Lesson, LessonForm};
    use crate::model::record::EntityKind;
    use crate::model::user::User;

    fn lesson_by(author: &User) -> Lesson {
        let fields = LessonForm {
            title: "Test".to_string(),
            description: "d".to_string(),
            difficulty: "beginner".to_string(),
            category: "slang".to_string(),
            country: "CO".to_string(),
            ..LessonForm::default()
        }
        .validate()
        .unwrap();
        Lesson::new(author.id, fields)
    }

    #[test]
    fn owner_and_superuser_may_edit() {
        let owner = User::new("owner", "");
        let stranger = User::new("stranger", "");
        let mut admin = User::new("admin", "");
        admin.is_superuser = true;
        let lesson = lesson_by(&owner);

        assert!(can_edit(&owner, &lesson));
        assert!(can_delete(&admin, &lesson));
        assert!(!can_edit(&stranger, &lesson));
        assert!(!can_delete(&stranger, &lesson));
    }

    #[test]
    fn edit_and_delete_agree_for_every_actor() {
        let owner = User::new("owner", "");
        let stranger = User::new("stranger", "");
        let mut staff = User::new("staff", "");
        staff.is_staff = true;
        let mut admin = User::new("admin", "");
        admin.is_superuser = true;
        let lesson = lesson_by(&owner);

        for actor in [&owner, &stranger, &staff, &admin] {
            let expected = owner_or_superuser(actor, &lesson);
            assert_eq!(can_edit(actor, &lesson), expected, "{}", actor.username);
            assert_eq!(can_delete(actor, &lesson), expected, "{}", actor.username);
        }
        assert!(!owner_or_superuser(&staff, &lesson));
    }

    #[test]
    fn expression_ownership_follows_lesson_author() {
        let owner = User::new("owner", "");
        let stranger = User::new("stranger", "");
        let lesson = lesson_by(&owner);
        let expression = Expression::new(Some(lesson.meta.id), ExpressionFields::default());
        let view = ExpressionOwnership {
            expression: &expression,
            lesson: Some(&lesson),
        };
        assert!(can_edit(&owner, &view));
        assert!(!can_edit(&stranger, &view));
    }

    #[test]
    fn orphan_expression_is_superuser_only() {
        let owner = User::new("owner", "");
        let mut admin = User::new("admin", "");
        admin.is_superuser = true;
        let expression = Expression::new(None, ExpressionFields::default());
        let view = ExpressionOwnership {
            expression: &expression,
            lesson: None,
        };
        assert!(!can_edit(&owner, &view));
        assert!(can_edit(&admin, &view));
    }

    #[test]
    fn staff_may_moderate() {
        let mut staff = User::new("staff", "");
        assert!(!can_moderate(&staff));
        staff.is_staff = true;
        assert!(can_moderate(&staff));
    }

    #[test]
    fn denial_message_names_action_and_entity() {
        assert_eq!(
            denial_message(Capability::Delete, EntityKind::ForumPost),
            "You do not have permission to delete this post."
        );
    }
}
