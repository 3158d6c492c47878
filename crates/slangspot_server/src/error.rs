//! HTTP error mapping.
//!
//! Forbidden answers 403 with the user-facing message, missing records 404,
//! rejected forms re-render with 200 and anonymous access to protected
//! pages redirects to the login page. Everything else is a logged 500.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use serde::Serialize;
use serde_json::{json, Value};
use slangspot_core::{DbError, FormErrors, ServiceError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Forbidden(String),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    /// Submitted form is echoed back next to its field errors.
    #[error("invalid form: {errors}")]
    Invalid { form: Value, errors: FormErrors },
    /// Holds the login redirect location.
    #[error("login required")]
    LoginRequired(String),
    #[error("database error: {0}")]
    Db(#[from] DbError),
    #[error("service error: {0}")]
    Service(ServiceError),
    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl AppError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Maps a service error, echoing `form` when validation failed.
    pub fn with_form<F: Serialize>(err: ServiceError, form: &F) -> Self {
        match err {
            ServiceError::Invalid(errors) => Self::Invalid {
                form: serde_json::to_value(form).unwrap_or(Value::Null),
                errors,
            },
            other => Self::from(other),
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Forbidden(_) => "forbidden",
            Self::NotFound { .. } => "not_found",
            Self::Invalid { .. } => "invalid_form",
            Self::LoginRequired(_) => "login_required",
            Self::Db(_) => "db_error",
            Self::Service(err) => err.code(),
            Self::Join(_) => "join_error",
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::Forbidden { message } => Self::Forbidden(message),
            ServiceError::NotFound { entity, id } => Self::NotFound { entity, id },
            ServiceError::Invalid(errors) => Self::Invalid {
                form: Value::Null,
                errors,
            },
            other => Self::Service(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Forbidden(message) => (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": "forbidden", "message": message })),
            )
                .into_response(),
            Self::NotFound { entity, id } => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "not_found", "entity": entity, "id": id })),
            )
                .into_response(),
            Self::Invalid { form, errors } => (
                StatusCode::OK,
                Json(json!({ "form": form, "errors": errors })),
            )
                .into_response(),
            Self::LoginRequired(location) => {
                (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
            }
            other => {
                error!(
                    "event=http_error module=http status=error error_code={} error={}",
                    other.code(),
                    other
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal_error" })),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AppError;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use slangspot_core::{FormErrors, ServiceError};

    #[test]
    fn service_errors_map_to_statuses() {
        let forbidden = AppError::from(ServiceError::Forbidden {
            message: "nope".to_string(),
        });
        assert_eq!(forbidden.into_response().status(), StatusCode::FORBIDDEN);

        let missing = AppError::from(ServiceError::NotFound {
            entity: "lesson",
            id: "x".to_string(),
        });
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);

        let invalid = AppError::from(ServiceError::Invalid(FormErrors::single("title", "bad")));
        assert_eq!(invalid.into_response().status(), StatusCode::OK);

        let broken = AppError::from(ServiceError::InconsistentState("lost row"));
        assert_eq!(
            broken.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn login_required_redirects_with_found() {
        let response = AppError::LoginRequired("/accounts/login/?next=/forum/".to_string())
            .into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()["location"],
            "/accounts/login/?next=/forum/"
        );
    }
}
