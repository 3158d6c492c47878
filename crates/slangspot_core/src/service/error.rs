//! Service-layer error shared by request orchestration services.

use crate::model::record::EntityKind;
use crate::model::validation::FormErrors;
use crate::permission::{denial_message, Capability};
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    /// The actor lacks permission; `message` is shown to the user.
    Forbidden { message: String },
    /// Target is missing or soft-deleted.
    NotFound { entity: &'static str, id: String },
    /// Form input failed validation; nothing was persisted.
    Invalid(FormErrors),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl ServiceError {
    pub fn forbidden(capability: Capability, kind: EntityKind) -> Self {
        Self::Forbidden {
            message: denial_message(capability, kind),
        }
    }

    pub fn not_found(kind: EntityKind, id: impl Display) -> Self {
        Self::NotFound {
            entity: kind.label(),
            id: id.to_string(),
        }
    }

    /// Stable code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Forbidden { .. } => "forbidden",
            Self::NotFound { .. } => "not_found",
            Self::Invalid(_) => "invalid_form",
            Self::Repo(_) => "repo_failure",
            Self::InconsistentState(_) => "inconsistent_state",
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forbidden { message } => write!(f, "{message}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Invalid(errors) => write!(f, "invalid form: {errors}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent state: {details}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound {
                entity: "record",
                id: id.to_string(),
            },
            other => Self::Repo(other),
        }
    }
}

impl From<FormErrors> for ServiceError {
    fn from(value: FormErrors) -> Self {
        Self::Invalid(value)
    }
}
