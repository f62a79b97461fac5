// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account registration, login and session routes.

use axum::{extract::State, http::StatusCode, routing::post, Extension, Json, Router};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::{Validate, ValidationError};

use crate::error::Result;
use crate::extract::ValidatedJson;
use crate::middleware::AuthUser;
use crate::models::{Gender, Location, LocationInput, Preferences, PreferencesPatch, UserSummary};
use crate::routes::MessageResponse;
use crate::services::profile::check_preferences;
use crate::services::{NewUser, TokenPair};
use crate::AppState;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh-token", post(refresh_token))
}

/// Session routes that require a valid access token.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/logout", post(logout))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 100))]
    pub password: String,
    #[validate(length(min = 2, max = 50))]
    pub first_name: String,
    #[validate(length(min = 2, max = 50))]
    pub last_name: String,
    #[validate(custom(function = "validate_birth_date"))]
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub bio: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[validate(nested)]
    pub location: LocationInput,
    #[validate(nested)]
    pub preferences: Option<PreferencesPatch>,
}

fn validate_birth_date(date: &NaiveDate) -> std::result::Result<(), ValidationError> {
    if *date >= Utc::now().date_naive() {
        return Err(ValidationError::new("date_of_birth_not_in_past"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

/// Body returned by register and login.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AuthResponse {
    pub message: String,
    pub user: UserSummary,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TokenResponse {
    pub message: String,
    pub access_token: String,
    pub refresh_token: String,
}

fn auth_response(message: &str, user: UserSummary, tokens: TokenPair) -> Json<AuthResponse> {
    Json(AuthResponse {
        message: message.to_string(),
        user,
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    })
}

/// Create an account and open its first session.
async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let preferences = body
        .preferences
        .as_ref()
        .map(|patch| patch.apply_to(&Preferences::default()))
        .unwrap_or_default();
    check_preferences(&preferences)?;

    let new_user = NewUser {
        email: body.email,
        password: body.password,
        first_name: body.first_name,
        last_name: body.last_name,
        date_of_birth: body.date_of_birth,
        gender: body.gender,
        bio: body.bio,
        interests: body.interests,
        location: Location::from(&body.location),
        preferences,
    };

    let (user, tokens) = state.sessions.register(new_user).await?;

    Ok((
        StatusCode::CREATED,
        auth_response(
            "User registered successfully",
            UserSummary::from(&user),
            tokens,
        ),
    ))
}

async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let (user, tokens) = state.sessions.login(&body.email, &body.password).await?;

    Ok(auth_response(
        "Login successful",
        UserSummary::from(&user),
        tokens,
    ))
}

/// Exchange the current refresh token for a new pair.
async fn refresh_token(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<RefreshTokenRequest>,
) -> Result<Json<TokenResponse>> {
    let tokens = state.sessions.refresh(&body.refresh_token).await?;

    Ok(Json(TokenResponse {
        message: "Token refreshed successfully".to_string(),
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    }))
}

async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<MessageResponse>> {
    state.sessions.logout(&auth).await?;

    Ok(MessageResponse::new("Logged out successfully"))
}
