// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed access/refresh token codec.
//!
//! Access tokens are short-lived HS256 JWTs carrying the user id and email.
//! Refresh tokens carry only the user id and are signed with a separate key,
//! so neither kind verifies as the other.

use crate::error::AppError;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Access token lifetime (15 minutes).
pub const ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;
/// Refresh token lifetime (7 days).
pub const REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Access token claims.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessClaims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Unique token ID
    pub jti: String,
}

/// Refresh token claims.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// Identity recovered from a valid access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessIdentity {
    pub user_id: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

/// Freshly issued access + refresh token pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues and verifies access/refresh tokens.
#[derive(Clone)]
pub struct TokenCodec {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
}

impl TokenCodec {
    pub fn new(access_secret: &[u8], refresh_secret: &[u8]) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret),
            access_decoding: DecodingKey::from_secret(access_secret),
            refresh_encoding: EncodingKey::from_secret(refresh_secret),
            refresh_decoding: DecodingKey::from_secret(refresh_secret),
        }
    }

    /// Create a 15-minute access token for a user.
    pub fn issue_access_token(
        &self,
        user_id: &str,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let iat = now.timestamp();
        let claims = AccessClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat,
            exp: iat + ACCESS_TOKEN_TTL_SECS,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.access_encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))
    }

    /// Create a 7-day refresh token for a user.
    pub fn issue_refresh_token(&self, user_id: &str, now: DateTime<Utc>) -> Result<String, AppError> {
        let iat = now.timestamp();
        let claims = RefreshClaims {
            sub: user_id.to_string(),
            iat,
            exp: iat + REFRESH_TOKEN_TTL_SECS,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.refresh_encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))
    }

    pub fn issue_pair(
        &self,
        user_id: &str,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(user_id, email, now)?,
            refresh_token: self.issue_refresh_token(user_id, now)?,
        })
    }

    /// Verify an access token at `now`.
    pub fn verify_access_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<AccessIdentity, AppError> {
        let claims: AccessClaims = decode_claims(token, &self.access_decoding, now)?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(AppError::InvalidToken)?;

        Ok(AccessIdentity {
            user_id: claims.sub,
            email: claims.email,
            expires_at,
        })
    }

    /// Verify a refresh token at `now`, returning the embedded user ID.
    pub fn verify_refresh_token(&self, token: &str, now: DateTime<Utc>) -> Result<String, AppError> {
        let claims: RefreshClaims = decode_claims(token, &self.refresh_decoding, now)?;
        Ok(claims.sub)
    }
}

trait Expiring {
    fn exp(&self) -> i64;
}

impl Expiring for AccessClaims {
    fn exp(&self) -> i64 {
        self.exp
    }
}

impl Expiring for RefreshClaims {
    fn exp(&self) -> i64 {
        self.exp
    }
}

/// Check signature and shape with `jsonwebtoken`, then expiry against the
/// injected clock rather than the library's wall clock.
fn decode_claims<C>(token: &str, key: &DecodingKey, now: DateTime<Utc>) -> Result<C, AppError>
where
    C: for<'de> Deserialize<'de> + Expiring,
{
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.set_required_spec_claims(&["exp", "iat", "sub"]);

    let token_data = decode::<C>(token, key, &validation).map_err(|e| {
        tracing::debug!(error = %e, "Token rejected");
        AppError::InvalidToken
    })?;

    if now.timestamp() >= token_data.claims.exp() {
        tracing::debug!("Token expired");
        return Err(AppError::InvalidToken);
    }

    Ok(token_data.claims)
}
