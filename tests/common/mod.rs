// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response};
use chrono::{DateTime, Duration, Utc};
use kindred_api::config::Config;
use kindred_api::db::{FirestoreDb, MemoryDb};
use kindred_api::routes::create_router;
use kindred_api::services::MemoryRevocationRegistry;
use kindred_api::time_utils::Clock;
use kindred_api::AppState;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Clock that only moves when a test says so.
#[derive(Clone)]
pub struct TestClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

#[allow(dead_code)]
impl TestClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Utc::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }

    pub fn clock(&self) -> Clock {
        let now = self.now.clone();
        Arc::new(move || *now.lock().unwrap())
    }
}

/// Test app over in-memory stores.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub clock: TestClock,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Register a user at `[longitude, latitude]` and return the response body.
    pub async fn register(&self, email: &str, coordinates: [f64; 2]) -> Value {
        let response = self
            .send(json_request(
                "POST",
                "/api/users/register",
                None,
                register_body(email, coordinates),
            ))
            .await;
        assert_eq!(response.status(), 201, "registration of {} failed", email);
        body_json(response).await
    }

    pub async fn login(&self, email: &str) -> Response<Body> {
        self.send(json_request(
            "POST",
            "/api/users/login",
            None,
            json!({ "email": email, "password": TEST_PASSWORD }),
        ))
        .await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Response<Body> {
        self.send(json_request(
            "POST",
            "/api/users/refresh-token",
            None,
            json!({ "refreshToken": refresh_token }),
        ))
        .await
    }
}

#[allow(dead_code)]
pub const TEST_PASSWORD: &str = "correct horse battery";

/// Create a test app with in-memory storage and a controllable clock.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> TestApp {
    let clock = TestClock::new();
    let state = Arc::new(AppState::new(
        config,
        Arc::new(MemoryDb::new()),
        Arc::new(MemoryRevocationRegistry::with_clock(clock.clock())),
        clock.clock(),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        clock,
    }
}

#[allow(dead_code)]
pub fn register_body(email: &str, coordinates: [f64; 2]) -> Value {
    json!({
        "email": email,
        "password": TEST_PASSWORD,
        "firstName": "Test",
        "lastName": "User",
        "dateOfBirth": "1995-06-15",
        "gender": "female",
        "bio": "",
        "interests": ["hiking"],
        "location": { "coordinates": coordinates }
    })
}

#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[allow(dead_code)]
pub fn bare_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
