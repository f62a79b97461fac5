// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Kindred: accounts, sessions and proximity search for a dating app.
//!
//! This crate provides the backend API: registration and login with
//! rotating refresh tokens, profile management, and a nearby-user search.

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::UserRepository;
use services::{RevocationRegistry, SessionManager, TokenCodec};
use std::sync::Arc;
use time_utils::Clock;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub users: Arc<dyn UserRepository>,
    pub sessions: SessionManager,
}

impl AppState {
    /// Wire the session manager from config and the chosen stores.
    pub fn new(
        config: Config,
        users: Arc<dyn UserRepository>,
        revocations: Arc<dyn RevocationRegistry>,
        clock: Clock,
    ) -> Self {
        let codec = TokenCodec::new(&config.jwt_access_secret, &config.jwt_refresh_secret);
        let sessions = SessionManager::new(users.clone(), revocations, codec, clock);
        Self {
            config,
            users,
            sessions,
        }
    }
}
