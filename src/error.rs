use std::collections::BTreeMap;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::utils::validation::{describe, field_error_from_detail};

/// Field-level validation messages, keyed by field path (e.g. `tickets[1]`).
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Single-field validation failure.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.into(), vec![message.into()]);
        AppError::Validation(errors)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errors)| (field.to_string(), errors.iter().map(describe).collect()))
            .collect();
        AppError::Validation(fields)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(_) => {
                let (field, message) = field_error_from_detail(&rejection.body_text());
                AppError::field(field, message)
            }
            other => AppError::BadRequest(other.body_text()),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        let (field, message) = field_error_from_detail(&rejection.body_text());
        AppError::field(field, message)
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                tracing::debug!(%detail, "Unique constraint violated");
                AppError::Conflict("Resource violates a uniqueness constraint".to_string())
            }
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                tracing::debug!(%detail, "Foreign key constraint violated");
                AppError::BadRequest("Referenced resource does not exist".to_string())
            }
            _ => AppError::Internal(format!("Database error: {}", err)),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<FieldErrors>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message, fields) = match self {
            AppError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                "Validation Error",
                "The provided data is invalid".to_string(),
                Some(fields),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Bad Request", msg, None),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "Unauthorized", msg, None),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "Forbidden", msg, None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not Found", msg, None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "Conflict", msg, None),
            AppError::TooManyRequests(msg) => {
                (StatusCode::TOO_MANY_REQUESTS, "Too Many Requests", msg, None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                    "An unexpected error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            message,
            fields,
        };

        (status, Json(body)).into_response()
    }
}
