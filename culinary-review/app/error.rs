use std::fmt;

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use hyper::StatusCode;
use nails::error::{NailsError, ServiceError};

use crate::media::MediaError;

pub type AppResult<T> = Result<T, AppError>;

/// Failure kinds surfaced by the use-case layer.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(what: &str) -> Self {
        AppError::NotFound(format!("{} not found", what))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        AppError::Unauthorized(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        AppError::Conflict(message.into())
    }
}

impl From<DieselError> for AppError {
    fn from(e: DieselError) -> Self {
        match e {
            DieselError::NotFound => AppError::not_found("record"),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                AppError::Conflict(format!("already exists: {}", info.message()))
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                AppError::Validation(format!("invalid reference: {}", info.message()))
            }
            e => AppError::Internal(e.into()),
        }
    }
}

impl From<diesel::r2d2::PoolError> for AppError {
    fn from(e: diesel::r2d2::PoolError) -> Self {
        AppError::Internal(anyhow::Error::new(e).context("database pool"))
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::Internal(e.into())
    }
}

impl From<MediaError> for AppError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::EmptyFile(_) => AppError::Validation(e.to_string()),
            e => AppError::Internal(anyhow::Error::new(e).context("media store")),
        }
    }
}

impl ServiceError for AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
    fn class_name(&self) -> &str {
        match self {
            AppError::NotFound(_) => "culinary_review::error::NotFound",
            AppError::Conflict(_) => "culinary_review::error::Conflict",
            AppError::Unauthorized(_) => "culinary_review::error::Unauthorized",
            AppError::Validation(_) => "culinary_review::error::Validation",
            AppError::Internal(_) => "culinary_review::error::Internal",
        }
    }
    fn has_public_message(&self) -> bool {
        !matches!(self, AppError::Internal(_))
    }
    fn fmt_public_message(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<AppError> for NailsError {
    fn from(e: AppError) -> Self {
        NailsError::from_service_error(e)
    }
}
