//! Error types for datasvc

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Main error type for datasvc
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Client input error, reported back verbatim
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found")]
    NotFound,

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Processing error: {0}")]
    Process(#[from] ProcessError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Document store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Document encoding error: {0}")]
    Encoding(String),

    #[error("Document decoding error: {0}")]
    Decoding(String),

    #[error("Store unavailable")]
    Unavailable,
}

/// Cache backend errors
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Timed out connecting after {0:?}")]
    ConnectTimeout(std::time::Duration),

    #[error("Cache unavailable")]
    Unavailable,
}

/// Reduction errors for `/api/process`
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessError {
    #[error("values must be an array")]
    NotAnArray,

    #[error("non-numeric value at index {0}")]
    NonNumeric(usize),
}

impl ServiceError {
    /// HTTP status this error maps to
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON body used for every 500
pub(crate) fn internal_error_body() -> serde_json::Value {
    json!({ "error": "Internal server error" })
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ServiceError::BadRequest(msg) => json!({ "error": msg }),
            ServiceError::NotFound => json!({ "error": "Not found" }),
            other => {
                error!("Internal error: {}", other);
                internal_error_body()
            }
        };
        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ServiceError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ServiceError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ServiceError::Store(StoreError::Unavailable).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ServiceError::Process(ProcessError::NonNumeric(2)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_display() {
        let err = ServiceError::from(CacheError::Unavailable);
        assert_eq!(err.to_string(), "Cache error: Cache unavailable");

        let err = ServiceError::from(ProcessError::NonNumeric(1));
        assert_eq!(
            err.to_string(),
            "Processing error: non-numeric value at index 1"
        );
    }
}
