//! Error type returned by every handler.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

pub const NOT_FOUND_BODY: &str = "File not found";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("File not found")]
    NotFound,

    /// Payload or query string is missing fields or has the wrong types.
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("malformed query: {0}")]
    BadQuery(String),

    /// Foreign-key or uniqueness violation reported by the store.
    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("database error: {0}")]
    Database(DbErr),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadQuery(_) => StatusCode::BAD_REQUEST,
            ApiError::Constraint(_) => StatusCode::CONFLICT,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => ApiError::Constraint(msg),
            Some(SqlErr::UniqueConstraintViolation(msg)) => ApiError::Constraint(msg),
            _ => match err {
                DbErr::RecordNotFound(_) => ApiError::NotFound,
                other => ApiError::Database(other),
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadQuery(rejection.body_text())
    }
}

// Item routes only resolve for integer ids, so an unparsable id is simply absent.
impl From<PathRejection> for ApiError {
    fn from(_: PathRejection) -> Self {
        ApiError::NotFound
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::NotFound => NOT_FOUND_BODY.to_string(),
            ApiError::Database(e) => {
                tracing::error!("database error: {e}");
                format!("DB error: {e}")
            }
            ApiError::Constraint(msg) => {
                tracing::warn!("constraint violation: {msg}");
                format!("Constraint violation: {msg}")
            }
            ApiError::Validation(msg) | ApiError::BadQuery(msg) => msg,
        };
        (status, body).into_response()
    }
}
