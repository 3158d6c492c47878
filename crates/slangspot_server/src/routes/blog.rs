//! Blog pages. Reading is public; writing requires login.

use crate::auth::{CurrentUser, MaybeUser};
use crate::error::AppError;
use crate::routes::{found, parse_id};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::{Form, Json};
use slangspot_core::model::blog::{BlogPost, BlogPostForm};
use slangspot_core::repo::blog_repo::SqliteBlogRepository;
use slangspot_core::service::blog_service::{BlogDetail, BlogService};
use slangspot_core::{EntityKind, LikeOutcome, SearchParams};

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<BlogPost>>, AppError> {
    let posts = state
        .with_db(move |conn, _| {
            Ok(BlogService::new(SqliteBlogRepository::new(conn)).list_published(&params)?)
        })
        .await?;
    Ok(Json(posts))
}

pub async fn detail(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(slug): Path<String>,
) -> Result<Json<BlogDetail>, AppError> {
    let detail = state
        .with_db(move |conn, _| {
            Ok(BlogService::new(SqliteBlogRepository::new(conn))
                .blog_detail(viewer.as_ref(), &slug)?)
        })
        .await?;
    Ok(Json(detail))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<BlogPostForm>,
) -> Result<Response, AppError> {
    let saved = state
        .with_db(move |conn, _| {
            BlogService::new(SqliteBlogRepository::new(conn))
                .create_post(&user, &form)
                .map_err(|err| AppError::with_form(err, &form))
        })
        .await?;
    Ok(found(&state, &saved.redirect))
}

pub async fn like(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
) -> Result<Json<LikeOutcome>, AppError> {
    let outcome = state
        .with_db(move |conn, _| {
            Ok(BlogService::new(SqliteBlogRepository::new(conn)).toggle_like(&user, &slug)?)
        })
        .await?;
    Ok(Json(outcome))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<BlogPostForm>,
) -> Result<Response, AppError> {
    let id = parse_id(&id, EntityKind::BlogPost)?;
    let saved = state
        .with_db(move |conn, _| {
            BlogService::new(SqliteBlogRepository::new(conn))
                .update_post(&user, id, &form)
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
    let id = parse_id(&id, EntityKind::BlogPost)?;
    let redirect = state
        .with_db(move |conn, _| {
            Ok(BlogService::new(SqliteBlogRepository::new(conn)).delete_post(&user, id)?)
        })
        .await?;
    Ok(found(&state, &redirect))
}
