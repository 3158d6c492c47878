//! Lesson and expression pages.

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::routes::{found, parse_id};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::{Form, Json};
use slangspot_core::model::lesson::{ExpressionForm, Lesson, LessonForm};
use slangspot_core::repo::lesson_repo::SqliteLessonRepository;
use slangspot_core::service::lesson_service::{LessonDetail, LessonService};
use slangspot_core::{EntityKind, SearchParams};

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Lesson>>, AppError> {
    let lessons = state
        .with_db(move |conn, _| {
            Ok(LessonService::new(SqliteLessonRepository::new(conn)).list_lessons(&params)?)
        })
        .await?;
    Ok(Json(lessons))
}

pub async fn detail(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<LessonDetail>, AppError> {
    let id = parse_id(&id, EntityKind::Lesson)?;
    let detail = state
        .with_db(move |conn, _| {
            Ok(LessonService::new(SqliteLessonRepository::new(conn)).lesson_detail(Some(&user), id)?)
        })
        .await?;
    Ok(Json(detail))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<LessonForm>,
) -> Result<Response, AppError> {
    let saved = state
        .with_db(move |conn, _| {
            LessonService::new(SqliteLessonRepository::new(conn))
                .create_lesson(&user, &form)
                .map_err(|err| AppError::with_form(err, &form))
        })
        .await?;
    Ok(found(&state, &saved.redirect))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<LessonForm>,
) -> Result<Response, AppError> {
    let id = parse_id(&id, EntityKind::Lesson)?;
    let saved = state
        .with_db(move |conn, _| {
            LessonService::new(SqliteLessonRepository::new(conn))
                .update_lesson(&user, id, &form)
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
    let id = parse_id(&id, EntityKind::Lesson)?;
    let redirect = state
        .with_db(move |conn, _| {
            Ok(LessonService::new(SqliteLessonRepository::new(conn)).delete_lesson(&user, id)?)
        })
        .await?;
    Ok(found(&state, &redirect))
}

pub async fn create_expression(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(lesson_id): Path<String>,
    Form(form): Form<ExpressionForm>,
) -> Result<Response, AppError> {
    let lesson_id = parse_id(&lesson_id, EntityKind::Lesson)?;
    let saved = state
        .with_db(move |conn, _| {
            LessonService::new(SqliteLessonRepository::new(conn))
                .create_expression(&user, lesson_id, &form)
                .map_err(|err| AppError::with_form(err, &form))
        })
        .await?;
    Ok(found(&state, &saved.redirect))
}

pub async fn update_expression(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<ExpressionForm>,
) -> Result<Response, AppError> {
    let id = parse_id(&id, EntityKind::Expression)?;
    let saved = state
        .with_db(move |conn, _| {
            LessonService::new(SqliteLessonRepository::new(conn))
                .update_expression(&user, id, &form)
                .map_err(|err| AppError::with_form(err, &form))
        })
        .await?;
    Ok(found(&state, &saved.redirect))
}

pub async fn delete_expression(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id, EntityKind::Expression)?;
    let redirect = state
        .with_db(move |conn, _| {
            Ok(LessonService::new(SqliteLessonRepository::new(conn)).delete_expression(&user, id)?)
        })
        .await?;
    Ok(found(&state, &redirect))
}
