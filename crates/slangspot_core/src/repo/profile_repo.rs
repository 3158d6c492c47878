//! User profile repository.
//!
//! # Invariants
//! - At most one profile row exists per user (`user_id` is unique).

use crate::model::profile::{ProfileFields, UserProfile};
use crate::model::record::UserId;
use crate::repo::common::{parse_meta, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const PROFILE_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    bio,
    preferred_language,
    learning_goals,
    website,
    location,
    avatar,
    reputation,
    created_at,
    updated_at,
    status,
    deleted_at
FROM user_profiles";

pub trait ProfileRepository {
    fn get_profile(&self, user_id: UserId) -> RepoResult<Option<UserProfile>>;
    /// Inserts `profile` unless the user already has one; returns the stored
    /// profile either way.
    fn get_or_create_profile(&self, profile: &UserProfile) -> RepoResult<UserProfile>;
    fn update_profile(&self, profile: &UserProfile) -> RepoResult<()>;
}

pub struct SqliteProfileRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProfileRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ProfileRepository for SqliteProfileRepository<'_> {
    fn get_profile(&self, user_id: UserId) -> RepoResult<Option<UserProfile>> {
        let sql = format!("{PROFILE_SELECT_SQL} WHERE user_id = ?1 AND status = 'active';");
        self.conn
            .query_row(&sql, [user_id.to_string()], |row| Ok(parse_profile_row(row)))
            .optional()?
            .transpose()
    }

    fn get_or_create_profile(&self, profile: &UserProfile) -> RepoResult<UserProfile> {
        let fields = &profile.fields;
        self.conn.execute(
            "INSERT OR IGNORE INTO user_profiles (
                id,
                user_id,
                bio,
                preferred_language,
                learning_goals,
                website,
                location,
                avatar,
                reputation,
                created_at,
                updated_at,
                status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 'active');",
            params![
                profile.meta.id.to_string(),
                profile.user_id.to_string(),
                fields.bio.as_str(),
                fields.preferred_language.as_str(),
                fields.learning_goals.as_str(),
                fields.website.as_str(),
                fields.location.as_str(),
                fields.avatar.as_deref(),
                profile.reputation,
                profile.meta.created_at,
                profile.meta.updated_at,
            ],
        )?;

        self.get_profile(profile.user_id)?.ok_or_else(|| {
            RepoError::InvalidData(format!(
                "profile for user {} is missing or deleted after insert",
                profile.user_id
            ))
        })
    }

    fn update_profile(&self, profile: &UserProfile) -> RepoResult<()> {
        let fields = &profile.fields;
        let changed = self.conn.execute(
            "UPDATE user_profiles
             SET
                bio = ?2,
                preferred_language = ?3,
                learning_goals = ?4,
                website = ?5,
                location = ?6,
                avatar = ?7,
                updated_at = ?8
             WHERE id = ?1
               AND status = 'active';",
            params![
                profile.meta.id.to_string(),
                fields.bio.as_str(),
                fields.preferred_language.as_str(),
                fields.learning_goals.as_str(),
                fields.website.as_str(),
                fields.location.as_str(),
                fields.avatar.as_deref(),
                profile.meta.updated_at,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(profile.meta.id));
        }
        Ok(())
    }
}

fn parse_profile_row(row: &Row<'_>) -> RepoResult<UserProfile> {
    let user_text: String = row.get("user_id")?;
    Ok(UserProfile {
        meta: parse_meta(row, "user_profiles")?,
        user_id: parse_uuid(&user_text, "user_profiles", "user_id")?,
        reputation: row.get("reputation")?,
        fields: ProfileFields {
            bio: row.get("bio")?,
            preferred_language: row.get("preferred_language")?,
            learning_goals: row.get("learning_goals")?,
            website: row.get("website")?,
            location: row.get("location")?,
            avatar: row.get("avatar")?,
        },
    })
}
