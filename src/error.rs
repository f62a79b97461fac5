// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("User already exists")]
    DuplicateIdentity,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid refresh token")]
    InvalidToken,

    #[error("Unauthorized - {0}")]
    Unauthorized(&'static str),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Cause of a 500 response, carried in the response extensions so that
/// [`expose_internal_errors`] can surface it in development mode.
#[derive(Debug, Clone)]
pub struct InternalErrorDetail(pub String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, error, detail) = match &self {
            AppError::Validation(details) => (
                StatusCode::BAD_REQUEST,
                "Invalid input".to_string(),
                Some(details.clone()),
                None,
            ),
            AppError::DuplicateIdentity
            | AppError::InvalidCredentials
            | AppError::InvalidToken
            | AppError::Unauthorized(_) => {
                let status = if matches!(self, AppError::DuplicateIdentity) {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::UNAUTHORIZED
                };
                (status, self.to_string(), None, None)
            }
            AppError::NotFound(what) => {
                tracing::debug!(what = %what, "Not found");
                (StatusCode::NOT_FOUND, "Not Found".to_string(), None, None)
            }
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                self.to_string(),
                None,
                None,
            ),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                    None,
                    Some(msg.clone()),
                )
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                    None,
                    Some(err.to_string()),
                )
            }
        };

        let mut response = (status, Json(ErrorResponse { message, error })).into_response();
        if let Some(detail) = detail {
            response.extensions_mut().insert(InternalErrorDetail(detail));
        }
        response
    }
}

/// Rewrite 500 bodies to include the underlying cause.
///
/// Only installed when running in development mode; production responses
/// never leak internal error text.
pub async fn expose_internal_errors(req: Request, next: Next) -> Response {
    let response = next.run(req).await;

    let Some(InternalErrorDetail(detail)) =
        response.extensions().get::<InternalErrorDetail>().cloned()
    else {
        return response;
    };

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    let body = Json(ErrorResponse {
        message: "Internal Server Error".to_string(),
        error: Some(detail),
    });
    (parts, body).into_response()
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
