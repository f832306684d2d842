//! Error handling for the Stockroom back-office
//!
//! Business-rule violations from the stock ledger map to 4xx responses
//! carrying a machine-readable code and the offending lot key; they are
//! never retried. Transient storage faults surface as 5xx after the retry
//! at the transaction boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::models::{LotKey, StockError};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    /// Constraint violations raised by the stock ledger.
    #[error(transparent)]
    Stock(#[from] StockError),

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// The lot a stock constraint was violated against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lot: Option<LotKey>,
}

impl ErrorDetail {
    fn new(code: &str, message: String) -> Self {
        Self {
            code: code.to_string(),
            message,
            field: None,
            lot: None,
        }
    }

    fn with_lot(code: &str, message: String, lot: LotKey) -> Self {
        Self {
            code: code.to_string(),
            message,
            field: None,
            lot: Some(lot),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("INVALID_CREDENTIALS", "Invalid login or password".to_string()),
            ),
            AppError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("TOKEN_EXPIRED", "Token has expired".to_string()),
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("INVALID_TOKEN", "Invalid token".to_string()),
            ),
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                    lot: None,
                },
            ),
            AppError::DuplicateEntry(field) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "DUPLICATE_ENTRY".to_string(),
                    message: format!("A record with this {} already exists", field),
                    field: Some(field.clone()),
                    lot: None,
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new("NOT_FOUND", format!("{} not found", resource)),
            ),
            AppError::InvalidStateTransition(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new("INVALID_STATE_TRANSITION", msg.clone()),
            ),
            AppError::Stock(err) => stock_error_detail(err),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("DATABASE_ERROR", "A database error occurred".to_string()),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", msg.clone()),
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                ),
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Map a ledger constraint violation to a status, a machine code and the
/// offending lot key.
fn stock_error_detail(err: &StockError) -> (StatusCode, ErrorDetail) {
    match err {
        StockError::UnknownLot { key } => (
            StatusCode::NOT_FOUND,
            ErrorDetail::with_lot("UNKNOWN_LOT", err.to_string(), *key),
        ),
        StockError::InsufficientStock { key, .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorDetail::with_lot("INSUFFICIENT_STOCK", err.to_string(), *key),
        ),
        StockError::InconsistentUnit { key, .. } => (
            StatusCode::CONFLICT,
            ErrorDetail::with_lot("INCONSISTENT_UNIT", err.to_string(), *key),
        ),
        StockError::AlreadySpent { .. } => (
            StatusCode::CONFLICT,
            ErrorDetail::new("ALREADY_SPENT", err.to_string()),
        ),
        StockError::LotNotFound { key } => (
            StatusCode::NOT_FOUND,
            ErrorDetail::with_lot("LOT_NOT_FOUND", err.to_string(), *key),
        ),
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
