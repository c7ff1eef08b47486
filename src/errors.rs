use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Definition-time rule violation (branch legality, name collisions, bad bounds).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A submitted value that failed parsing or the question's constraints.
    /// The value is still stored; callers treat this as a soft failure.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Question '{0}' has not been presented in this attempt")]
    UnknownQuestionForAttempt(String),

    #[error("Attempt '{0}' is already completed")]
    AttemptAlreadyCompleted(String),

    #[error("Response conflict: {0}")]
    DuplicateResponseConflict(String),

    #[error("Score already computed for attempt '{0}'")]
    ScoreAlreadyComputed(String),

    #[error("Attempt '{0}' is not completed yet")]
    AttemptNotYetCompleted(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::AlreadyExists(_) => "ALREADY_EXISTS",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::UnknownQuestionForAttempt(_) => "UNKNOWN_QUESTION_FOR_ATTEMPT",
            AppError::AttemptAlreadyCompleted(_) => "ATTEMPT_ALREADY_COMPLETED",
            AppError::DuplicateResponseConflict(_) => "DUPLICATE_RESPONSE_CONFLICT",
            AppError::ScoreAlreadyComputed(_) => "SCORE_ALREADY_COMPUTED",
            AppError::AttemptNotYetCompleted(_) => "ATTEMPT_NOT_YET_COMPLETED",
            AppError::PermissionDenied(_) => "PERMISSION_DENIED",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    pub status: u16,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyExists(_) => StatusCode::CONFLICT,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::UnknownQuestionForAttempt(_) => StatusCode::NOT_FOUND,
            AppError::AttemptAlreadyCompleted(_) => StatusCode::CONFLICT,
            AppError::DuplicateResponseConflict(_) => StatusCode::FORBIDDEN,
            AppError::ScoreAlreadyComputed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::AttemptNotYetCompleted(_) => StatusCode::CONFLICT,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
            code: self.error_code(),
            status: self.status_code().as_u16(),
        })
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}
impl From<mongodb::bson::ser::Error> for AppError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        AppError::InternalError(format!("BSON serialization error: {}", err))
    }
}
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ValidationError(format!("Malformed document: {}", err))
    }
}

pub type AppResult<T> = Result<T, AppError>;
