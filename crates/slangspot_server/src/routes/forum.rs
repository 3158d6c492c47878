//! Forum pages and actions.

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::routes::{found, parse_id};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::{Form, Json};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use slangspot_core::model::forum::{
    Category, CategoryForm, CommentForm, ForumPostForm, ModerationAction, Tag,
};
use slangspot_core::repo::forum_repo::{PopularPost, SqliteForumRepository};
use slangspot_core::repo::notification_repo::SqliteNotificationRepository;
use slangspot_core::repo::user_repo::SqliteUserRepository;
use slangspot_core::service::forum_service::{ForumService, PostDetail, PostSummary};
use slangspot_core::service::notification_service::NotificationService;
use slangspot_core::{EntityKind, FormErrors, LikeOutcome, Publisher, SearchParams};

type SqliteForumService<'a> = ForumService<
    'a,
    SqliteForumRepository<'a>,
    SqliteUserRepository<'a>,
    SqliteNotificationRepository<'a>,
>;

fn service<'a>(conn: &'a Connection, publisher: &'a dyn Publisher) -> SqliteForumService<'a> {
    ForumService::new(
        SqliteForumRepository::new(conn),
        SqliteUserRepository::new(conn),
        NotificationService::new(SqliteNotificationRepository::new(conn), publisher),
    )
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModerateForm {
    pub action: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PopularQuery {
    pub days: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<PostSummary>>, AppError> {
    let posts = state
        .with_db(move |conn, publisher| Ok(service(conn, publisher).list_posts(&params)?))
        .await?;
    Ok(Json(posts))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<ForumPostForm>,
) -> Result<Response, AppError> {
    let saved = state
        .with_db(move |conn, publisher| {
            service(conn, publisher)
                .create_post(&user, &form)
                .map_err(|err| AppError::with_form(err, &form))
        })
        .await?;
    Ok(found(&state, &saved.redirect))
}

pub async fn detail(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<PostDetail>, AppError> {
    let id = parse_id(&id, EntityKind::ForumPost)?;
    let detail = state
        .with_db(move |conn, publisher| Ok(service(conn, publisher).post_detail(&user, id)?))
        .await?;
    Ok(Json(detail))
}

pub async fn comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<CommentForm>,
) -> Result<Response, AppError> {
    let id = parse_id(&id, EntityKind::ForumPost)?;
    let saved = state
        .with_db(move |conn, publisher| {
            service(conn, publisher)
                .add_comment(&user, id, &form)
                .map_err(|err| AppError::with_form(err, &form))
        })
        .await?;
    Ok(found(&state, &saved.redirect))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<ForumPostForm>,
) -> Result<Response, AppError> {
    let id = parse_id(&id, EntityKind::ForumPost)?;
    let saved = state
        .with_db(move |conn, publisher| {
            service(conn, publisher)
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
    let id = parse_id(&id, EntityKind::ForumPost)?;
    let redirect = state
        .with_db(move |conn, publisher| Ok(service(conn, publisher).delete_post(&user, id)?))
        .await?;
    Ok(found(&state, &redirect))
}

pub async fn like(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<LikeOutcome>, AppError> {
    let id = parse_id(&id, EntityKind::ForumPost)?;
    let outcome = state
        .with_db(move |conn, publisher| Ok(service(conn, publisher).toggle_post_like(&user, id)?))
        .await?;
    Ok(Json(outcome))
}

pub async fn moderate(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<ModerateForm>,
) -> Result<Response, AppError> {
    let id = parse_id(&id, EntityKind::ForumPost)?;
    let Some(action) = ModerationAction::parse(form.action.trim()) else {
        return Err(AppError::Invalid {
            form: serde_json::to_value(&form).unwrap_or_default(),
            errors: FormErrors::single("action", "Select a valid choice."),
        });
    };
    let saved = state
        .with_db(move |conn, publisher| Ok(service(conn, publisher).moderate_post(&user, id, action)?))
        .await?;
    Ok(found(&state, &saved.redirect))
}

pub async fn update_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<CommentForm>,
) -> Result<Response, AppError> {
    let id = parse_id(&id, EntityKind::Comment)?;
    let saved = state
        .with_db(move |conn, publisher| {
            service(conn, publisher)
                .update_comment(&user, id, &form)
                .map_err(|err| AppError::with_form(err, &form))
        })
        .await?;
    Ok(found(&state, &saved.redirect))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id, EntityKind::Comment)?;
    let redirect = state
        .with_db(move |conn, publisher| Ok(service(conn, publisher).delete_comment(&user, id)?))
        .await?;
    Ok(found(&state, &redirect))
}

pub async fn like_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<LikeOutcome>, AppError> {
    let id = parse_id(&id, EntityKind::Comment)?;
    let outcome = state
        .with_db(move |conn, publisher| {
            Ok(service(conn, publisher).toggle_comment_like(&user, id)?)
        })
        .await?;
    Ok(Json(outcome))
}

pub async fn categories(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<Vec<Category>>, AppError> {
    let categories = state
        .with_db(move |conn, publisher| Ok(service(conn, publisher).list_categories()?))
        .await?;
    Ok(Json(categories))
}

pub async fn create_category(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<CategoryForm>,
) -> Result<Response, AppError> {
    let saved = state
        .with_db(move |conn, publisher| {
            service(conn, publisher)
                .create_category(&user, &form)
                .map_err(|err| AppError::with_form(err, &form))
        })
        .await?;
    Ok(found(&state, &saved.redirect))
}

pub async fn tags(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<Vec<Tag>>, AppError> {
    let tags = state
        .with_db(move |conn, publisher| Ok(service(conn, publisher).list_tags()?))
        .await?;
    Ok(Json(tags))
}

/// `?days=N` widens or narrows the window; malformed values use the default.
pub async fn popular(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(query): Query<PopularQuery>,
) -> Result<Json<Vec<PopularPost>>, AppError> {
    let days = query.days.as_deref().and_then(|raw| raw.trim().parse().ok());
    let posts = state
        .with_db(move |conn, publisher| Ok(service(conn, publisher).popular_posts(days)?))
        .await?;
    Ok(Json(posts))
}
