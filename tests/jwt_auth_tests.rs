// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT wire-format tests.
//!
//! These tests decode tokens issued over HTTP with a plain `jsonwebtoken`
//! validator, catching claim-layout or algorithm changes early.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use kindred_api::config::Config;
use kindred_api::services::tokens::{AccessClaims, RefreshClaims};

mod common;
use common::create_test_app;

#[tokio::test]
async fn test_access_token_claims() {
    let app = create_test_app();
    let body = app.register("claims@example.com", [0.0, 0.0]).await;
    let token = body["accessToken"].as_str().unwrap();

    let config = Config::test_default();
    let data = decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(&config.jwt_access_secret),
        &Validation::new(Algorithm::HS256),
    )
    .expect("access token should decode with the access secret");

    assert_eq!(data.claims.sub, body["user"]["id"].as_str().unwrap());
    assert_eq!(data.claims.email, "claims@example.com");
    assert_eq!(data.claims.exp - data.claims.iat, 15 * 60);
    assert!(!data.claims.jti.is_empty());
}

#[tokio::test]
async fn test_refresh_token_claims() {
    let app = create_test_app();
    let body = app.register("refresh-claims@example.com", [0.0, 0.0]).await;
    let token = body["refreshToken"].as_str().unwrap();

    let config = Config::test_default();
    let data = decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(&config.jwt_refresh_secret),
        &Validation::new(Algorithm::HS256),
    )
    .expect("refresh token should decode with the refresh secret");

    assert_eq!(data.claims.sub, body["user"]["id"].as_str().unwrap());
    assert_eq!(data.claims.exp - data.claims.iat, 7 * 24 * 60 * 60);

    // Not signed with the access secret
    assert!(decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(&config.jwt_access_secret),
        &Validation::new(Algorithm::HS256),
    )
    .is_err());
}
