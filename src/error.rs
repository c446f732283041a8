// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request (malformed form input, short password, bad import)
    ValidationError(String),

    // 400 Wrong one-time verification code
    VerificationMismatch,

    // 401 Missing or invalid bearer token
    Unauthorized(String),

    // 401 Wrong email/password pair
    InvalidCredential(String),

    // 403 Authenticated but not allowed (role, inactive, unverified)
    Forbidden(String),

    // 403 Email not whitelisted, or quiz access denied
    NotEligible(String),

    // 403 A valid passing result already exists
    AlreadyPassed,

    // 403 Valid attempts reached the course limit
    AttemptsExhausted { max_attempts: i64 },

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (e.g., duplicate whitelist entry)
    Conflict(String),

    // 409 Email already has an account
    AlreadyRegistered(String),

    // 422 Course has an empty question bank
    NoQuestions,
}

impl AppError {
    /// Stable machine-readable kind, returned next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InternalServerError(_) => "internal",
            AppError::ValidationError(_) => "validation_error",
            AppError::VerificationMismatch => "verification_mismatch",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::InvalidCredential(_) => "invalid_credential",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotEligible(_) => "not_eligible",
            AppError::AlreadyPassed => "already_passed",
            AppError::AttemptsExhausted { .. } => "attempts_exhausted",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::AlreadyRegistered(_) => "already_registered",
            AppError::NoQuestions => "no_questions",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ValidationError(_) | AppError::VerificationMismatch => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) | AppError::InvalidCredential(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_)
            | AppError::NotEligible(_)
            | AppError::AlreadyPassed
            | AppError::AttemptsExhausted { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::AlreadyRegistered(_) => StatusCode::CONFLICT,
            AppError::NoQuestions => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn user_message(&self) -> String {
        match self {
            AppError::InternalServerError(_) => "Internal Server Error".to_string(),
            AppError::VerificationMismatch => "Verification code does not match".to_string(),
            AppError::AlreadyPassed => "You have already passed this quiz".to_string(),
            AppError::AttemptsExhausted { max_attempts } => {
                format!("All {max_attempts} attempts have been used")
            }
            AppError::NoQuestions => "This course has no questions yet".to_string(),
            AppError::ValidationError(msg)
            | AppError::Unauthorized(msg)
            | AppError::InvalidCredential(msg)
            | AppError::Forbidden(msg)
            | AppError::NotEligible(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::AlreadyRegistered(msg) => msg.clone(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::InternalServerError(msg) = &self {
            tracing::error!("Internal Server Error: {}", msg);
        }
        let body = Json(json!({
            "error": self.user_message(),
            "code": self.code(),
        }));

        (self.status(), body).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

/// Returns true when a database error is a UNIQUE constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}
