//! Actor resolution.
//!
//! Authentication happens upstream; the acting user's id arrives in the
//! configured actor header. [`CurrentUser`] guards login-only pages and
//! [`MaybeUser`] serves pages that anonymous visitors may read.

use crate::error::AppError;
use crate::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use slangspot_core::repo::user_repo::SqliteUserRepository;
use slangspot_core::service::user_service::UserService;
use slangspot_core::User;
use uuid::Uuid;

/// Authenticated actor; anonymous requests are redirected to login.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Actor when one is known.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match resolve_actor(parts, state).await? {
            Some(user) => Ok(Self(user)),
            None => {
                let next = parts
                    .uri
                    .path_and_query()
                    .map_or_else(|| parts.uri.path().to_string(), ToString::to_string);
                Err(AppError::LoginRequired(state.config.login_location(&next)))
            }
        }
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Self(resolve_actor(parts, state).await?))
    }
}

/// Unknown or malformed ids resolve to no actor.
async fn resolve_actor(parts: &Parts, state: &AppState) -> Result<Option<User>, AppError> {
    let Some(user_id) = parts
        .headers
        .get(state.config.actor_header.as_str())
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
    else {
        return Ok(None);
    };

    state
        .with_db(move |conn, _| {
            Ok(UserService::new(SqliteUserRepository::new(conn)).find_user(user_id)?)
        })
        .await
}
