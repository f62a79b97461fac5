// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer: the user repository and its backends.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{Gender, User};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// One document per registered address, keyed by the encoded email
    pub const USER_EMAILS: &str = "user_emails";
}

/// Coarse pre-filter for proximity search. Backends may return extra
/// candidates; exact distance and age checks happen in the search service.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateQuery {
    pub gender: Option<Gender>,
    pub min_latitude: f64,
    pub max_latitude: f64,
}

/// Persistent user records.
///
/// Emails passed in are expected to be normalized already
/// (see [`crate::models::user::normalize_email`]).
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
    /// Insert a new user. Fails with [`AppError::DuplicateIdentity`] if the
    /// email is already taken, even when two creates race.
    async fn create(&self, user: &User) -> Result<(), AppError>;
    async fn update(&self, user: &User) -> Result<(), AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
    async fn find_candidates(&self, query: &CandidateQuery) -> Result<Vec<User>, AppError>;
}
