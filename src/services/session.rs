// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session lifecycle: register, login, refresh, logout, authenticate.
//!
//! Each user holds at most one live refresh token. Issuing a new pair
//! overwrites the stored token, which implicitly invalidates every earlier
//! refresh token for that user. Logged-out access tokens go on the
//! revocation blacklist until they would have expired.

use crate::db::UserRepository;
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::user::normalize_email;
use crate::models::{Gender, Location, Preferences, User};
use crate::services::password;
use crate::services::revocation::RevocationRegistry;
use crate::services::tokens::{TokenCodec, TokenPair, ACCESS_TOKEN_TTL_SECS};
use crate::time_utils::Clock;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use std::time::Duration;

/// How long a logged-out access token stays blacklisted. Fixed at the full
/// access-token lifetime, an upper bound on any token's remaining validity.
pub const REVOCATION_TTL: Duration = Duration::from_secs(ACCESS_TOKEN_TTL_SECS as u64);

/// Everything needed to create an account. Fields are already validated.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub bio: String,
    pub interests: Vec<String>,
    pub location: Location,
    pub preferences: Preferences,
}

/// Orchestrates token issuance, rotation and revocation.
#[derive(Clone)]
pub struct SessionManager {
    users: Arc<dyn UserRepository>,
    revocations: Arc<dyn RevocationRegistry>,
    codec: TokenCodec,
    clock: Clock,
}

impl SessionManager {
    pub fn new(
        users: Arc<dyn UserRepository>,
        revocations: Arc<dyn RevocationRegistry>,
        codec: TokenCodec,
        clock: Clock,
    ) -> Self {
        Self {
            users,
            revocations,
            codec,
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Create a new account and sign it in.
    pub async fn register(&self, new_user: NewUser) -> Result<(User, TokenPair), AppError> {
        let email = normalize_email(&new_user.email);

        if self.users.find_by_email(&email).await?.is_some() {
            tracing::info!("Registration rejected: email already in use");
            return Err(AppError::DuplicateIdentity);
        }

        let password_hash = hash_password(new_user.password).await?;
        let now = self.now();
        let id = uuid::Uuid::new_v4().to_string();
        let tokens = self.codec.issue_pair(&id, &email, now)?;

        let user = User {
            id,
            email,
            password_hash,
            first_name: new_user.first_name.trim().to_string(),
            last_name: new_user.last_name.trim().to_string(),
            date_of_birth: new_user.date_of_birth,
            gender: new_user.gender,
            bio: new_user.bio,
            interests: trim_all(new_user.interests),
            photos: Vec::new(),
            location: new_user.location,
            preferences: new_user.preferences,
            last_active: now,
            is_verified: false,
            refresh_token: Some(tokens.refresh_token.clone()),
            created_at: now,
            updated_at: now,
        };

        self.users.create(&user).await?;
        tracing::info!(user_id = %user.id, "User registered");

        Ok((user, tokens))
    }

    /// Check credentials and issue a fresh token pair.
    ///
    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, TokenPair), AppError> {
        let email = normalize_email(email);

        let Some(user) = self.users.find_by_email(&email).await? else {
            tracing::info!("Login failed: unknown email");
            return Err(AppError::InvalidCredentials);
        };

        if !verify_password(user.password_hash.clone(), password.to_string()).await? {
            tracing::info!(user_id = %user.id, "Login failed: wrong password");
            return Err(AppError::InvalidCredentials);
        }

        let now = self.now();
        let tokens = self.codec.issue_pair(&user.id, &user.email, now)?;
        let user = User {
            refresh_token: Some(tokens.refresh_token.clone()),
            last_active: now,
            ..user
        };
        self.users.update(&user).await?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok((user, tokens))
    }

    /// Exchange the current refresh token for a new pair (rotation).
    ///
    /// Any refresh token other than the most recently issued one is rejected,
    /// even if its signature and expiry are fine.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        let now = self.now();
        let user_id = self.codec.verify_refresh_token(refresh_token, now)?;

        let user = self
            .users
            .find_by_id(&user_id)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if user.refresh_token.as_deref() != Some(refresh_token) {
            tracing::warn!(user_id = %user.id, "Stale refresh token presented");
            return Err(AppError::InvalidToken);
        }

        let tokens = self.codec.issue_pair(&user.id, &user.email, now)?;
        let user = User {
            refresh_token: Some(tokens.refresh_token.clone()),
            last_active: now,
            ..user
        };
        self.users.update(&user).await?;

        tracing::debug!(user_id = %user.id, "Refresh token rotated");
        Ok(tokens)
    }

    /// Blacklist the presented access token and drop the stored refresh token.
    pub async fn logout(&self, auth: &AuthUser) -> Result<(), AppError> {
        self.revocations.revoke(&auth.token, REVOCATION_TTL).await?;

        // Re-read so a concurrent profile update is not clobbered.
        match self.users.find_by_id(&auth.user.id).await? {
            Some(user) => {
                let user = User {
                    refresh_token: None,
                    ..user
                };
                self.users.update(&user).await?;
            }
            None => {
                tracing::warn!(user_id = %auth.user.id, "User vanished during logout");
            }
        }

        tracing::info!(user_id = %auth.user.id, "User logged out");
        Ok(())
    }

    /// Resolve a bearer access token into the request's identity context.
    pub async fn authenticate(&self, access_token: &str) -> Result<AuthUser, AppError> {
        if self.revocations.is_revoked(access_token).await? {
            return Err(AppError::Unauthorized("Token is invalid"));
        }

        let identity = self
            .codec
            .verify_access_token(access_token, self.now())
            .map_err(|_| AppError::Unauthorized("Invalid token"))?;

        let user = self
            .users
            .find_by_id(&identity.user_id)
            .await?
            .ok_or(AppError::Unauthorized("User not found"))?;

        Ok(AuthUser {
            user,
            token: access_token.to_string(),
            expires_at: identity.expires_at,
        })
    }
}

fn trim_all(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Argon2 is deliberately slow; keep it off the async workers.
async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing task failed: {}", e)))?
        .map_err(|e| AppError::Internal(e.into()))
}

async fn verify_password(hash: String, password: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || password::verify_password(&hash, &password))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password check task failed: {}", e)))
}
