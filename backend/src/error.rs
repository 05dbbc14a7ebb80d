//! Error handling for the Stationery Stock Ledger
//!
//! Domain errors are raised where they are detected and propagate unchanged
//! to the axum boundary, where they are mapped to a status code and a JSON
//! error envelope. The transaction wrapping the failing operation rolls back
//! fully, so no partial ledger mutation is observable.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{resource} with id {id} not found")]
    NotFound { resource: &'static str, id: String },

    #[error("Insufficient stock for item '{item_name}'. Requested: {requested}, Available: {available}")]
    InsufficientStock {
        item_name: String,
        requested: i32,
        available: i64,
    },

    #[error("Rule violation: {0}")]
    RuleViolation(String),

    // Single-field domain check that failed inside a service
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    // Request-shape validation collected by the `validator` derive
    #[error("Validation failed")]
    FieldValidation(#[from] validator::ValidationErrors),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<serde_json::Map<String, serde_json::Value>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::NotFound { .. } => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message: self.to_string(),
                    field: None,
                    fields: None,
                },
            ),
            AppError::InsufficientStock { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INSUFFICIENT_STOCK".to_string(),
                    message: self.to_string(),
                    field: None,
                    fields: None,
                },
            ),
            AppError::RuleViolation(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "RULE_VIOLATION".to_string(),
                    message: message.clone(),
                    field: None,
                    fields: None,
                },
            ),
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                    fields: None,
                },
            ),
            AppError::FieldValidation(errors) => {
                let fields: serde_json::Map<String, serde_json::Value> = errors
                    .field_errors()
                    .into_iter()
                    .map(|(field, field_errors)| {
                        let message = field_errors
                            .first()
                            .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                            .unwrap_or_else(|| format!("{} is invalid", field));
                        (field.to_string(), serde_json::Value::String(message))
                    })
                    .collect();

                (
                    StatusCode::BAD_REQUEST,
                    ErrorDetail {
                        code: "VALIDATION_ERROR".to_string(),
                        message: "Validation failed".to_string(),
                        field: None,
                        fields: Some(fields),
                    },
                )
            }
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message: "A database error occurred".to_string(),
                    field: None,
                    fields: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred".to_string(),
                    field: None,
                    fields: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
