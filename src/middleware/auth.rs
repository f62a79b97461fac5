// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer-token authentication middleware.

use crate::error::AppError;
use crate::models::User;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Authenticated request context, inserted into request extensions by
/// [`require_auth`] and read by handlers via `Extension<AuthUser>`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// User record as loaded during authentication
    pub user: User,
    /// The raw access token presented (needed for logout)
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthUser {
    pub fn user_id(&self) -> &str {
        &self.user.id
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(value: &str) -> Option<&str> {
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Middleware that requires a valid, unrevoked access token.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(bearer_token)
        .ok_or(AppError::Unauthorized("No token provided"))?
        .to_string();

    let auth_user = state.sessions.authenticate(&token).await?;
    tracing::debug!(user_id = %auth_user.user_id(), "Request authenticated");

    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}
