// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error body tests: storage failures surface as 500s, with the cause shown
//! only in development.

use axum::http::StatusCode;
use kindred_api::config::{Config, Environment};
use kindred_api::db::FirestoreDb;
use kindred_api::routes::create_router;
use kindred_api::services::MemoryRevocationRegistry;
use kindred_api::time_utils::system_clock;
use kindred_api::AppState;
use std::sync::Arc;
use tower::ServiceExt;

mod common;
use common::{body_json, json_request, register_body};

/// App whose user store is an offline Firestore handle, so every query fails.
fn offline_app(environment: Environment) -> axum::Router {
    let config = Config {
        environment,
        ..Config::test_default()
    };
    let state = Arc::new(AppState::new(
        config,
        Arc::new(FirestoreDb::new_offline()),
        Arc::new(MemoryRevocationRegistry::default()),
        system_clock(),
    ));
    create_router(state)
}

#[tokio::test]
async fn test_storage_failure_detail_in_development() {
    let response = offline_app(Environment::Development)
        .oneshot(json_request(
            "POST",
            "/api/users/register",
            None,
            register_body("dev@example.com", [0.0, 0.0]),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Internal Server Error");
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Database not connected"));
}

#[tokio::test]
async fn test_storage_failure_hidden_in_production() {
    let response = offline_app(Environment::Production)
        .oneshot(json_request(
            "POST",
            "/api/users/register",
            None,
            register_body("prod@example.com", [0.0, 0.0]),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Internal Server Error");
    assert!(body.get("error").is_none());
}
