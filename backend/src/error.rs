//! Error handling for the Stockpile Management Platform
//!
//! Provides consistent error responses in Japanese and English

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::stock::StockError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authorization errors
    #[error("Insufficient permissions")]
    InsufficientPermissions,

    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_ja: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl From<StockError> for AppError {
    fn from(err: StockError) -> Self {
        let (field, message_ja) = match &err {
            StockError::NonPositiveQuantity(_) => ("quantity", "数量は正の整数で指定してください"),
            StockError::NegativePrice => ("purchase_price", "購入価格は0以上で指定してください"),
        };
        AppError::Validation {
            field: field.to_string(),
            message: err.to_string(),
            message_ja: message_ja.to_string(),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_ja: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::InsufficientPermissions => (
                StatusCode::FORBIDDEN,
                ErrorDetail {
                    code: "INSUFFICIENT_PERMISSIONS".to_string(),
                    message_en: "You do not have permission to perform this action".to_string(),
                    message_ja: "この操作を行う権限がありません".to_string(),
                    field: None,
                },
            ),
            AppError::Validation { field, message, message_ja } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: message.clone(),
                    message_ja: message_ja.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: msg.clone(),
                    message_ja: format!("入力内容が正しくありません: {}", msg),
                    field: None,
                },
            ),
            AppError::DuplicateEntry(field) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "DUPLICATE_ENTRY".to_string(),
                    message_en: format!("A record with this {} already exists", field),
                    message_ja: format!("この{}は既に登録されています", field),
                    field: Some(field.clone()),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message_en: format!("{} not found", resource),
                    message_ja: format!("{}が見つかりません", resource),
                    field: None,
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message_en: "A database error occurred".to_string(),
                    message_ja: "データベースエラーが発生しました".to_string(),
                    field: None,
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: msg.clone(),
                    message_ja: "サーバー内部でエラーが発生しました".to_string(),
                    field: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: "An internal server error occurred".to_string(),
                    message_ja: "サーバー内部でエラーが発生しました".to_string(),
                    field: None,
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
