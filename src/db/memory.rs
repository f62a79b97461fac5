// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory [`UserRepository`] for tests and local development.

use crate::db::{CandidateQuery, UserRepository};
use crate::error::AppError;
use crate::models::User;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Users keyed by ID, plus an email → ID index that enforces uniqueness.
#[derive(Default)]
pub struct MemoryDb {
    users: DashMap<String, User>,
    emails: DashMap<String, String>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserRepository for MemoryDb {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let Some(id) = self.emails.get(email).map(|entry| entry.value().clone()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(id).map(|u| u.clone()))
    }

    async fn create(&self, user: &User) -> Result<(), AppError> {
        // The shard lock on the email entry is held until the user is stored
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(AppError::DuplicateIdentity),
            Entry::Vacant(slot) => {
                self.users.insert(user.id.clone(), user.clone());
                slot.insert(user.id.clone());
                Ok(())
            }
        }
    }

    async fn update(&self, user: &User) -> Result<(), AppError> {
        self.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        if let Some((_, user)) = self.users.remove(id) {
            self.emails.remove_if(&user.email, |_, owner| owner == id);
        }
        Ok(())
    }

    async fn find_candidates(&self, query: &CandidateQuery) -> Result<Vec<User>, AppError> {
        Ok(self
            .users
            .iter()
            .map(|entry| entry.value().clone())
            .filter(|u| query.gender.map_or(true, |g| u.gender == g))
            .filter(|u| {
                u.location.latitude >= query.min_latitude
                    && u.location.latitude <= query.max_latitude
            })
            .collect())
    }
}
