use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::error;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error.")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Turns a unique-constraint failure into a 409 carrying `message`,
    /// passing every other database error through untouched.
    pub fn conflict_on_unique(err: sqlx::Error, message: &str) -> Self {
        if is_unique_violation(&err) {
            ApiError::Conflict(message.to_string())
        } else {
            ApiError::Database(err)
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::Database(err) => error!("Database error: {err}"),
            ApiError::Internal(message) => error!("Internal error: {message}"),
            _ => {}
        }

        HttpResponse::build(self.status_code()).json(json!({ "message": self.to_string() }))
    }
}

// SQLITE_CONSTRAINT_UNIQUE and SQLITE_CONSTRAINT_PRIMARYKEY extended result codes.
const UNIQUE_VIOLATION_CODES: [&str; 2] = ["2067", "1555"];

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            let code_matches = db_err
                .code()
                .map(|code| UNIQUE_VIOLATION_CODES.contains(&&*code))
                .unwrap_or(false);
            code_matches || db_err.message().contains("UNIQUE constraint failed")
        }
        _ => false,
    }
}

// SQLITE_BUSY and its extended codes: BUSY_RECOVERY, BUSY_SNAPSHOT and
// BUSY_TIMEOUT.
const BUSY_CODES: [&str; 4] = ["5", "261", "517", "773"];

/// True when SQLite refused a lock because another connection holds it.
pub fn is_busy(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err
            .code()
            .map(|code| BUSY_CODES.contains(&&*code))
            .unwrap_or(false),
        _ => false,
    }
}
