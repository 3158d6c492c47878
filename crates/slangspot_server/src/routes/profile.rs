use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::routes::found;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::{Form, Json};
use rusqlite::Connection;
use slangspot_core::model::profile::ProfileForm;
use slangspot_core::repo::forum_repo::SqliteForumRepository;
use slangspot_core::repo::profile_repo::SqliteProfileRepository;
use slangspot_core::repo::user_repo::SqliteUserRepository;
use slangspot_core::service::profile_service::{ProfilePage, ProfileService};
use slangspot_core::EntityKind;
use uuid::Uuid;

type SqliteProfileService<'a> = ProfileService<
    SqliteProfileRepository<'a>,
    SqliteUserRepository<'a>,
    SqliteForumRepository<'a>,
>;

fn service(conn: &Connection) -> SqliteProfileService<'_> {
    ProfileService::new(
        SqliteProfileRepository::new(conn),
        SqliteUserRepository::new(conn),
        SqliteForumRepository::new(conn),
    )
}

pub async fn own(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ProfilePage>, AppError> {
    let page = state
        .with_db(move |conn, _| Ok(service(conn).own_profile(&user)?))
        .await?;
    Ok(Json(page))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<ProfileForm>,
) -> Result<Response, AppError> {
    let saved = state
        .with_db(move |conn, _| {
            service(conn)
                .update_profile(&user, user.id, &form)
                .map_err(|err| AppError::with_form(err, &form))
        })
        .await?;
    Ok(found(&state, &saved.redirect))
}

pub async fn public(
    State(state): State<AppState>,
    CurrentUser(_viewer): CurrentUser,
    Path(user_id): Path<String>,
) -> Result<Json<ProfilePage>, AppError> {
    let user_id = Uuid::parse_str(user_id.trim())
        .map_err(|_| AppError::not_found(EntityKind::User.label(), user_id.as_str()))?;
    let page = state
        .with_db(move |conn, _| Ok(service(conn).public_profile(user_id)?))
        .await?;
    Ok(Json(page))
}
