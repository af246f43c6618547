//! Unified API error handling
//!
//! Reviewer and webhook endpoints share this error body. The chat-flow
//! function endpoints keep their own `{success, mensaje}` contract.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbError;
use crate::service::cases::CaseServiceError;
use crate::service::webhook::WebhookError;

/// Standard error response format
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error type/code
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Unique request ID for tracing
    pub request_id: String,
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ApiError {
    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Bad request / validation error (400)
    #[error("{0}")]
    BadRequest(String),

    /// Webhook signature missing or wrong (401)
    #[error("Firma inválida")]
    InvalidSignature,

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidSignature => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_type = match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::InvalidSignature => "invalid_signature",
            ApiError::Internal(_) => "internal_error",
            ApiError::Database(_) => "database_error",
        };

        if status.is_server_error() {
            tracing::error!(
                error_type = error_type,
                status = status.as_u16(),
                message = %self,
                "API error"
            );
        } else {
            tracing::info!(
                error_type = error_type,
                status = status.as_u16(),
                message = %self,
                "Request rejected"
            );
        }

        HttpResponse::build(status).json(ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
            request_id: Uuid::new_v4().to_string(),
        })
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(id) => ApiError::NotFound(id),
            _ => ApiError::Database(err.to_string()),
        }
    }
}

impl From<CaseServiceError> for ApiError {
    fn from(err: CaseServiceError) -> Self {
        match err {
            CaseServiceError::CaseNotFound(_) => ApiError::NotFound("Caso no encontrado".to_string()),
            CaseServiceError::DbError(e) => e.into(),
            CaseServiceError::InvalidClassification | CaseServiceError::InvalidRequest(_) => {
                ApiError::BadRequest(err.to_string())
            }
        }
    }
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        match err {
            WebhookError::InvalidSignature => ApiError::InvalidSignature,
            WebhookError::InvalidPayload(e) => ApiError::BadRequest(e.to_string()),
            WebhookError::DbError(e) => e.into(),
        }
    }
}
