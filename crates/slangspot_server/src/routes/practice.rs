//! Private practice pages.

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::routes::{found, parse_id, PageQuery};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::{Form, Json};
use slangspot_core::model::practice::{Practice, PracticeForm};
use slangspot_core::repo::practice_repo::SqlitePracticeRepository;
use slangspot_core::service::practice_service::PracticeService;
use slangspot_core::EntityKind;

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<Practice>>, AppError> {
    let (limit, offset) = (page.limit(), page.offset());
    let practices = state
        .with_db(move |conn, _| {
            Ok(PracticeService::new(SqlitePracticeRepository::new(conn))
                .list_own(&user, limit, offset)?)
        })
        .await?;
    Ok(Json(practices))
}

pub async fn detail(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Practice>, AppError> {
    let id = parse_id(&id, EntityKind::Practice)?;
    let practice = state
        .with_db(move |conn, _| {
            Ok(PracticeService::new(SqlitePracticeRepository::new(conn))
                .practice_detail(&user, id)?)
        })
        .await?;
    Ok(Json(practice))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<PracticeForm>,
) -> Result<Response, AppError> {
    let saved = state
        .with_db(move |conn, _| {
            PracticeService::new(SqlitePracticeRepository::new(conn))
                .create_practice(&user, &form)
                .map_err(|err| AppError::with_form(err, &form))
        })
        .await?;
    Ok(found(&state, &saved.redirect))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<PracticeForm>,
) -> Result<Response, AppError> {
    let id = parse_id(&id, EntityKind::Practice)?;
    let saved = state
        .with_db(move |conn, _| {
            PracticeService::new(SqlitePracticeRepository::new(conn))
                .update_practice(&user, id, &form)
                .map_err(|err| AppError::with_form(err, &form))
        })
        .await?;
    Ok(found(&state, &saved.redirect))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id, EntityKind::Practice)?;
    let redirect = state
        .with_db(move |conn, _| {
            Ok(PracticeService::new(SqlitePracticeRepository::new(conn))
                .delete_practice(&user, id)?)
        })
        .await?;
    Ok(found(&state, &redirect))
}
