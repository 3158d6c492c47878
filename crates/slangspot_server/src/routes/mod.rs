//! HTTP routing.
//!
//! # Responsibility
//! - Map the public URL layout onto core services.
//! - Translate service outcomes into pages (JSON), redirects and errors.
//!
//! # Invariants
//! - Every handler touching storage runs on the blocking pool with its own
//!   connection.
//! - Successful mutations answer `302 Found` with the configured location.

mod blog;
mod forum;
mod health;
mod lessons;
mod notifications;
mod practice;
mod profile;

use crate::error::AppError;
use crate::live::notifications_socket;
use crate::middleware::response_time;
use crate::state::AppState;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use slangspot_core::{EntityKind, RecordId, RedirectTarget};
use uuid::Uuid;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/lessons/", get(lessons::list).post(lessons::create))
        .route("/lessons/{id}/", get(lessons::detail))
        .route("/lessons/{id}/edit/", post(lessons::update))
        .route("/lessons/{id}/delete/", post(lessons::delete))
        .route("/lessons/{id}/expressions/", post(lessons::create_expression))
        .route("/expressions/{id}/edit/", post(lessons::update_expression))
        .route("/expressions/{id}/delete/", post(lessons::delete_expression))
        .route("/forum/", get(forum::list).post(forum::create))
        .route(
            "/forum/categories/",
            get(forum::categories).post(forum::create_category),
        )
        .route("/forum/tags/", get(forum::tags))
        .route("/forum/popular/", get(forum::popular))
        .route("/forum/post/{id}/", get(forum::detail).post(forum::comment))
        .route("/forum/post/{id}/edit/", post(forum::update))
        .route("/forum/post/{id}/delete/", post(forum::delete))
        .route("/forum/post/{id}/like/", post(forum::like))
        .route("/forum/post/{id}/moderate/", post(forum::moderate))
        .route("/forum/comment/{id}/edit/", post(forum::update_comment))
        .route("/forum/comment/{id}/delete/", post(forum::delete_comment))
        .route("/forum/comment/{id}/like/", post(forum::like_comment))
        .route("/blog/", get(blog::list).post(blog::create))
        .route("/blog/{slug}/", get(blog::detail))
        .route("/blog/{slug}/like/", post(blog::like))
        .route("/blog/post/{id}/edit/", post(blog::update))
        .route("/blog/post/{id}/delete/", post(blog::delete))
        .route("/practice/", get(practice::list).post(practice::create))
        .route("/practice/{id}/", get(practice::detail))
        .route("/practice/{id}/edit/", post(practice::update))
        .route("/practice/{id}/delete/", post(practice::delete))
        .route("/profile/", get(profile::own).post(profile::update))
        .route("/profile/{user_id}/", get(profile::public))
        .route("/notifications/", get(notifications::unread))
        .route("/notifications/{id}/read/", post(notifications::mark_read))
        .route(
            "/notifications/mark-all-read/",
            post(notifications::mark_all_read),
        )
        .route("/ws/notifications", get(notifications_socket))
        .layer(axum::middleware::from_fn(response_time))
        .with_state(state)
}

/// `302 Found` to the location configured for `target`.
pub(crate) fn found(state: &AppState, target: &RedirectTarget) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, state.config.location(target))],
    )
        .into_response()
}

/// Malformed ids cannot name a record, so they are reported as missing.
pub(crate) fn parse_id(raw: &str, kind: EntityKind) -> Result<RecordId, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::not_found(kind.label(), raw))
}

/// `?limit=&offset=` pagination. Malformed values are treated as unset.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct PageQuery {
    limit: Option<String>,
    offset: Option<String>,
}

impl PageQuery {
    pub(crate) fn limit(&self) -> Option<u32> {
        self.limit
            .as_deref()
            .and_then(|raw| raw.trim().parse().ok())
            .filter(|limit| *limit > 0)
    }

    pub(crate) fn offset(&self) -> u32 {
        self.offset
            .as_deref()
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(0)
    }
}
