//! Account provisioning and lookup.
//!
//! Login and registration flows live outside the application; this service
//! only provisions the accounts that act on content.

use crate::model::record::{EntityKind, UserId};
use crate::model::user::User;
use crate::model::validation::FormErrors;
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoError;
use crate::service::error::{ServiceError, ServiceResult};
use log::info;

pub struct UserService<U: UserRepository> {
    repo: U,
}

impl<U: UserRepository> UserService<U> {
    pub fn new(repo: U) -> Self {
        Self { repo }
    }

    /// Validates and stores a new account.
    ///
    /// A taken username (case-insensitive) is reported as a field error.
    pub fn create_user(&self, user: &User) -> ServiceResult<User> {
        user.validate()?;
        if self.repo.find_by_username(user.username.trim())?.is_some() {
            return Err(username_taken());
        }

        let mut stored = user.clone();
        stored.username = user.username.trim().to_string();
        match self.repo.create_user(&stored) {
            Ok(_) => {}
            Err(RepoError::Conflict(_)) => return Err(username_taken()),
            Err(err) => return Err(err.into()),
        }
        info!(
            "event=user_create module=service status=ok user_id={} superuser={} staff={}",
            stored.id, stored.is_superuser, stored.is_staff
        );
        Ok(stored)
    }

    pub fn get_user(&self, id: UserId) -> ServiceResult<User> {
        self.repo
            .get_user(id)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::User, id))
    }

    pub fn find_user(&self, id: UserId) -> ServiceResult<Option<User>> {
        Ok(self.repo.get_user(id)?)
    }
}

fn username_taken() -> ServiceError {
    FormErrors::single("username", "A user with that username already exists.").into()
}
