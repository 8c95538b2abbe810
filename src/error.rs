use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

/// SQLSTATE raised by Postgres on unique constraint / unique index violations.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Conflict error: {0}")]
    Conflict(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Create a new validation error
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new not found error
    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new internal error
    pub fn internal<T: Into<String>>(msg: T) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a new authentication error
    pub fn authentication<T: Into<String>>(msg: T) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a new authorization error
    pub fn authorization<T: Into<String>>(msg: T) -> Self {
        Self::Authorization(msg.into())
    }

    /// Create a new conflict error
    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create a new invalid state error
    pub fn invalid_state<T: Into<String>>(msg: T) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Translate a unique-violation database error into `Conflict`, leaving
    /// every other error untouched.
    pub fn conflict_on_unique_violation<T: Into<String>>(err: sqlx::Error, msg: T) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                return Self::Conflict(msg.into());
            }
        }
        Self::Database(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();

        let (status, error_message, error_code) = match self {
            ApiError::Database(ref err) => {
                tracing::error!(
                    error_id = %error_id,
                    error = %err,
                    "database error occurred"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error",
                    "DATABASE_ERROR",
                )
            }
            ApiError::Validation(ref msg) => {
                tracing::warn!(
                    error_id = %error_id,
                    error = %msg,
                    "validation error occurred"
                );
                (StatusCode::BAD_REQUEST, msg.as_str(), "VALIDATION_ERROR")
            }
            ApiError::NotFound(ref msg) => {
                tracing::info!(
                    error_id = %error_id,
                    error = %msg,
                    "resource not found"
                );
                (StatusCode::NOT_FOUND, msg.as_str(), "NOT_FOUND")
            }
            ApiError::Configuration(ref msg) => {
                tracing::error!(
                    error_id = %error_id,
                    error = %msg,
                    "configuration error occurred"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Configuration error",
                    "CONFIG_ERROR",
                )
            }
            ApiError::Migration(ref err) => {
                tracing::error!(
                    error_id = %error_id,
                    error = %err,
                    "database migration error occurred"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database migration error",
                    "MIGRATION_ERROR",
                )
            }
            ApiError::Authentication(ref msg) => {
                tracing::warn!(
                    error_id = %error_id,
                    error = %msg,
                    "authentication error occurred"
                );
                (
                    StatusCode::UNAUTHORIZED,
                    msg.as_str(),
                    "AUTHENTICATION_ERROR",
                )
            }
            ApiError::Authorization(ref msg) => {
                tracing::warn!(
                    error_id = %error_id,
                    error = %msg,
                    "authorization error occurred"
                );
                (StatusCode::FORBIDDEN, msg.as_str(), "AUTHORIZATION_ERROR")
            }
            ApiError::Conflict(ref msg) => {
                tracing::warn!(
                    error_id = %error_id,
                    error = %msg,
                    "conflict error occurred"
                );
                (StatusCode::CONFLICT, msg.as_str(), "CONFLICT_ERROR")
            }
            ApiError::InvalidState(ref msg) => {
                tracing::warn!(
                    error_id = %error_id,
                    error = %msg,
                    "invalid state transition requested"
                );
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    msg.as_str(),
                    "INVALID_STATE",
                )
            }
            ApiError::Internal(ref msg) => {
                tracing::error!(
                    error_id = %error_id,
                    error = %msg,
                    "internal server error occurred"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    "INTERNAL_ERROR",
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": error_message,
                "code": error_code,
                "error_id": error_id,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        }));

        (status, body).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;
