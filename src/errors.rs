use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Unique error codes for client identification
#[derive(Debug, Clone, Copy)]
pub enum ErrorCode {
    // Database errors (1xxx)
    DatabaseConnection = 1001,
    DatabaseQuery = 1002,
    DatabaseTransaction = 1003,

    // Validation errors (2xxx)
    ValidationFailed = 2001,
    InvalidFormat = 2002,
    MissingField = 2003,
    UnsupportedImageType = 2004,

    // Booking errors (3xxx)
    SlotConflict = 3001,

    // External service errors (5xxx)
    EmbeddingServiceError = 5001,
    ExtractionServiceError = 5002,
    StorageError = 5003,

    // Resource errors (6xxx)
    NotFound = 6001,

    // Internal errors (9xxx)
    InternalError = 9001,
    ConfigurationError = 9002,
}

impl ErrorCode {
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    // Database errors
    #[error("Database connection error: {0}")]
    DatabaseConnectionError(String),

    #[error("Database query error: {0}")]
    DatabaseQueryError(#[from] sea_orm::DbErr),

    #[error("Database transaction failed: {0}")]
    DatabaseTransactionError(String),

    // Validation errors
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Unsupported image type: {0}. Only jpg, jpeg, png images are allowed")]
    UnsupportedImageType(String),

    // Booking errors
    #[error("This slot is already booked")]
    SlotConflict,

    // External service errors
    #[error("Embedding service error: {0}")]
    EmbeddingError(String),

    #[error("Entity extraction error: {0}")]
    ExtractionError(String),

    #[error("Object storage error: {0}")]
    StorageError(String),

    // Resource errors
    #[error("Resource not found: {resource_type} with id {resource_id}")]
    NotFound {
        resource_type: String,
        resource_id: String,
    },

    // Internal errors
    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),
}

impl AppError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::DatabaseConnectionError(_) => ErrorCode::DatabaseConnection,
            Self::DatabaseQueryError(_) => ErrorCode::DatabaseQuery,
            Self::DatabaseTransactionError(_) => ErrorCode::DatabaseTransaction,
            Self::ValidationError(_) => ErrorCode::ValidationFailed,
            Self::InvalidFormat(_) => ErrorCode::InvalidFormat,
            Self::MissingField(_) => ErrorCode::MissingField,
            Self::UnsupportedImageType(_) => ErrorCode::UnsupportedImageType,
            Self::SlotConflict => ErrorCode::SlotConflict,
            Self::EmbeddingError(_) => ErrorCode::EmbeddingServiceError,
            Self::ExtractionError(_) => ErrorCode::ExtractionServiceError,
            Self::StorageError(_) => ErrorCode::StorageError,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::InternalError(_) => ErrorCode::InternalError,
            Self::ConfigError(_) => ErrorCode::ConfigurationError,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::DatabaseConnectionError(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::DatabaseQueryError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::DatabaseTransactionError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::InvalidFormat(_) => StatusCode::BAD_REQUEST,
            Self::MissingField(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedImageType(_) => StatusCode::BAD_REQUEST,
            Self::SlotConflict => StatusCode::CONFLICT,
            Self::EmbeddingError(_) => StatusCode::BAD_GATEWAY,
            Self::ExtractionError(_) => StatusCode::BAD_GATEWAY,
            Self::StorageError(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();

        // Log based on severity
        match &self {
            AppError::ValidationError(_)
            | AppError::InvalidFormat(_)
            | AppError::MissingField(_)
            | AppError::UnsupportedImageType(_)
            | AppError::NotFound { .. } => {
                tracing::debug!(error_code = error_code.as_u16(), %message, "Client error");
            }
            AppError::SlotConflict => {
                tracing::info!(error_code = error_code.as_u16(), %message, "Booking conflict");
            }
            _ => {
                tracing::error!(error_code = error_code.as_u16(), %message, error = ?self, "Server error");
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code.as_u16(),
                "status": status.as_u16(),
                "message": message,
                "details": if cfg!(debug_assertions) {
                    Some(format!("{:?}", self))
                } else {
                    None
                }
            }
        }));

        (status, body).into_response()
    }
}

/// Helper macro for creating NotFound errors
#[macro_export]
macro_rules! not_found {
    ($resource_type:expr, $resource_id:expr) => {
        $crate::errors::AppError::NotFound {
            resource_type: $resource_type.to_string(),
            resource_id: $resource_id.to_string(),
        }
    };
}
