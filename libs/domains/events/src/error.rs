//! Event domain error types

use axum_helpers::AppError;
use thiserror::Error;

/// Result type for event operations
pub type Result<T> = std::result::Result<T, EventError>;

/// Event domain errors
#[derive(Debug, Error)]
pub enum EventError {
    /// Submission failed validation on a named field
    #[error("{message}")]
    Validation { field: String, message: String },

    /// Image has an unsupported content type or is too large
    #[error("{0}")]
    MediaRejected(String),

    /// Store round trip failed
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A stored document could not be read as an event
    #[error("Unreadable event document: {0}")]
    CorruptDocument(String),

    /// Media host rejected the upload or could not be reached
    #[error("Media upload failed: {0}")]
    UpstreamUpload(String),

    #[error("An event with slug '{0}' already exists")]
    DuplicateSlug(String),

    #[error("Event not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EventError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The standard "is required" failure for `field`.
    pub fn required(field: &str) -> Self {
        let label = match field {
            "title" => "'title' (or 'eventName')".to_string(),
            other => format!("'{}'", other),
        };
        Self::validation(field, format!("Validation Failed: {} is required", label))
    }
}

impl From<mongodb::error::Error> for EventError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}

impl From<reqwest::Error> for EventError {
    fn from(err: reqwest::Error) -> Self {
        Self::UpstreamUpload(err.to_string())
    }
}

// Convert to axum_helpers::AppError for HTTP responses
impl From<EventError> for AppError {
    fn from(err: EventError) -> Self {
        match err {
            EventError::Validation { field, message } => AppError::FieldValidation { field, message },
            EventError::MediaRejected(message) => AppError::MediaRejected(message),
            EventError::StoreUnavailable(message) => AppError::StoreUnavailable(message),
            EventError::UpstreamUpload(message) => AppError::UpstreamUploadFailed(message),
            err @ EventError::CorruptDocument(_) => AppError::InternalServerError(err.to_string()),
            err @ EventError::DuplicateSlug(_) => AppError::Conflict(err.to_string()),
            err @ EventError::NotFound(_) => AppError::NotFound(err.to_string()),
            EventError::Internal(message) => AppError::InternalServerError(message),
        }
    }
}

impl axum::response::IntoResponse for EventError {
    fn into_response(self) -> axum::response::Response {
        AppError::from(self).into_response()
    }
}
