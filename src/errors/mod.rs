use actix_web::{error::ResponseError, HttpResponse};
use serde::Serialize;
use std::fmt;

#[derive(Debug)]
pub enum PublicationError {
    DatabaseError(String),
    StorageError(String),
    ValidationError(String),
    FileProcessingError(String),
    NotFound(String),
    Unauthorized(String),
    HashingError(String),
    InternalError(String),
    Conflict(String),
}

impl fmt::Display for PublicationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PublicationError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            PublicationError::StorageError(msg) => write!(f, "Storage error: {}", msg),
            PublicationError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            PublicationError::FileProcessingError(msg) => {
                write!(f, "File processing error: {}", msg)
            }
            PublicationError::NotFound(msg) => write!(f, "Not found error: {}", msg),
            PublicationError::Unauthorized(msg) => write!(f, "Unauthorized error: {}", msg),
            PublicationError::HashingError(msg) => write!(f, "Hashing error: {}", msg),
            PublicationError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            PublicationError::Conflict(msg) => write!(f, "Conflict error: {}", msg),
        }
    }
}

impl std::error::Error for PublicationError {}

impl From<rusqlite::Error> for PublicationError {
    fn from(err: rusqlite::Error) -> Self {
        PublicationError::DatabaseError(err.to_string())
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ResponseError for PublicationError {
    fn error_response(&self) -> HttpResponse {
        let (code, message) = match self {
            PublicationError::ValidationError(msg) => ("VALIDATION_ERROR", msg),
            PublicationError::DatabaseError(msg) => ("DATABASE_ERROR", msg),
            PublicationError::StorageError(msg) => ("STORAGE_ERROR", msg),
            PublicationError::FileProcessingError(msg) => ("FILE_PROCESSING_ERROR", msg),
            PublicationError::NotFound(msg) => ("NOT_FOUND_ERROR", msg),
            PublicationError::Unauthorized(msg) => ("UNAUTHORIZED_ERROR", msg),
            PublicationError::HashingError(msg) => ("HASHING_ERROR", msg),
            PublicationError::InternalError(msg) => ("INTERNAL_ERROR", msg),
            PublicationError::Conflict(msg) => ("CONFLICT_ERROR", msg),
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: code.to_string(),
            message: message.to_string(),
        })
    }

    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            PublicationError::ValidationError(_) => StatusCode::BAD_REQUEST,
            PublicationError::FileProcessingError(_) => StatusCode::BAD_REQUEST,
            PublicationError::NotFound(_) => StatusCode::NOT_FOUND,
            PublicationError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            PublicationError::Conflict(_) => StatusCode::CONFLICT,
            PublicationError::DatabaseError(_)
            | PublicationError::StorageError(_)
            | PublicationError::HashingError(_)
            | PublicationError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
