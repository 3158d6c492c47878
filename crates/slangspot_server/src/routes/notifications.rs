//! Notification inbox. Live pushes are served by [`crate::live`].

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::routes::{parse_id, PageQuery};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;
use slangspot_core::model::notification::Notification;
use slangspot_core::repo::notification_repo::SqliteNotificationRepository;
use slangspot_core::service::notification_service::{NotificationService, ReadOutcome};
use slangspot_core::EntityKind;

#[derive(Debug, Serialize)]
pub struct Inbox {
    pub unread_count: u32,
    pub notifications: Vec<Notification>,
}

pub async fn unread(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(page): Query<PageQuery>,
) -> Result<Json<Inbox>, AppError> {
    let limit = page.limit();
    let inbox = state
        .with_db(move |conn, publisher| {
            let service =
                NotificationService::new(SqliteNotificationRepository::new(conn), publisher);
            Ok(Inbox {
                unread_count: service.unread_count(&user)?,
                notifications: service.list_unread(&user, limit)?,
            })
        })
        .await?;
    Ok(Json(inbox))
}

pub async fn mark_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ReadOutcome>, AppError> {
    let id = parse_id(&id, EntityKind::Notification)?;
    let outcome = state
        .with_db(move |conn, publisher| {
            Ok(
                NotificationService::new(SqliteNotificationRepository::new(conn), publisher)
                    .mark_read(&user, id)?,
            )
        })
        .await?;
    Ok(Json(outcome))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ReadOutcome>, AppError> {
    let outcome = state
        .with_db(move |conn, publisher| {
            Ok(
                NotificationService::new(SqliteNotificationRepository::new(conn), publisher)
                    .mark_all_read(&user)?,
            )
        })
        .await?;
    Ok(Json(outcome))
}
