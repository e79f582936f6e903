//! Error types for the import pipeline and the HTTP layer.
//!
//! `ParseError` is the only failure that aborts an import. `RowError` and its
//! sources are caught per row by the importer and turned into report entries.
//! `ApiError` is what handlers return; it renders as `{ "error": "..." }`.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// The uploaded file could not be read as a CSV at all.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("the uploaded file is empty")]
    Empty,
    #[error("the uploaded file has no header row")]
    MissingHeader,
    #[error("could not read the CSV header: {0}")]
    Csv(#[from] csv::Error),
}

/// Content problems that keep a row out of the database.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing title")]
    MissingTitle,
    #[error("invalid date in {column}: '{value}'")]
    InvalidDate { column: String, value: String },
    #[error("invalid coverage range")]
    InvalidCoverageRange,
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("could not encode story: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Why a single row was rejected.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("unreadable row: {0}")]
    Unreadable(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("missing or invalid bearer token")]
    Unauthorized,
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("{0}")]
    Internal(String),
}

impl From<actix_multipart::MultipartError> for ApiError {
    fn from(e: actix_multipart::MultipartError) -> Self {
        ApiError::BadRequest(format!("invalid upload: {}", e))
    }
}

impl From<actix_web::error::BlockingError> for ApiError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        ApiError::Internal(format!("blocking task failed: {}", e))
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Parse(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Database(_) | ApiError::Persistence(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}
