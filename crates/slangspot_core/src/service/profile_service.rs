//! Profile use-cases: own profile, profile updates and public profile pages.
//!
//! # Invariants
//! - A profile is created lazily the first time it is requested.
//! - Public pages never expose the account email.

use crate::model::forum::{Comment, ForumPost};
use crate::model::profile::{ProfileForm, UserProfile};
use crate::model::record::{now_epoch_ms, EntityKind, UserId};
use crate::model::user::User;
use crate::permission::{can_edit, Capability};
use crate::repo::forum_repo::{ForumRepository, UserStats};
use crate::repo::profile_repo::ProfileRepository;
use crate::repo::user_repo::UserRepository;
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::outcome::{RedirectTarget, Saved};
use serde::Serialize;

pub const RECENT_ACTIVITY_DAYS: i64 = 7;
const DAY_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicUser {
    pub id: UserId,
    pub username: String,
}

impl From<&User> for PublicUser {
    fn from(value: &User) -> Self {
        Self {
            id: value.id,
            username: value.username.clone(),
        }
    }
}

/// Forum posts and comments of the last [`RECENT_ACTIVITY_DAYS`] days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentActivity {
    pub posts: Vec<ForumPost>,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfilePage {
    pub user: PublicUser,
    pub profile: UserProfile,
    pub stats: UserStats,
    pub recent_activity: RecentActivity,
}

pub struct ProfileService<P, U, F>
where
    P: ProfileRepository,
    U: UserRepository,
    F: ForumRepository,
{
    profiles: P,
    users: U,
    forum: F,
}

impl<P, U, F> ProfileService<P, U, F>
where
    P: ProfileRepository,
    U: UserRepository,
    F: ForumRepository,
{
    pub fn new(profiles: P, users: U, forum: F) -> Self {
        Self {
            profiles,
            users,
            forum,
        }
    }

    /// Returns the user's profile, creating a default one if missing.
    pub fn get_or_create(&self, user_id: UserId) -> ServiceResult<UserProfile> {
        if let Some(profile) = self.profiles.get_profile(user_id)? {
            return Ok(profile);
        }
        Ok(self
            .profiles
            .get_or_create_profile(&UserProfile::new(user_id))?)
    }

    pub fn own_profile(&self, actor: &User) -> ServiceResult<ProfilePage> {
        self.page_for(actor)
    }

    pub fn public_profile(&self, user_id: UserId) -> ServiceResult<ProfilePage> {
        let user = self
            .users
            .get_user(user_id)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::User, user_id))?;
        self.page_for(&user)
    }

    pub fn update_profile(
        &self,
        actor: &User,
        user_id: UserId,
        form: &ProfileForm,
    ) -> ServiceResult<Saved<UserProfile>> {
        let mut profile = self.get_or_create(user_id)?;
        if !can_edit(actor, &profile) {
            return Err(ServiceError::forbidden(Capability::Edit, EntityKind::Profile));
        }
        profile.fields = form.validate()?;
        profile.meta.touch();
        self.profiles.update_profile(&profile)?;
        let redirect = if user_id == actor.id {
            RedirectTarget::Profile
        } else {
            RedirectTarget::PublicProfile(user_id)
        };
        Ok(Saved::new(profile, redirect))
    }

    fn page_for(&self, user: &User) -> ServiceResult<ProfilePage> {
        let since = now_epoch_ms() - RECENT_ACTIVITY_DAYS * DAY_MS;
        Ok(ProfilePage {
            user: PublicUser::from(user),
            profile: self.get_or_create(user.id)?,
            stats: self.forum.user_stats(user.id)?,
            recent_activity: RecentActivity {
                posts: self.forum.recent_posts_by(user.id, since)?,
                comments: self.forum.recent_comments_by(user.id, since)?,
            },
        })
    }
}
