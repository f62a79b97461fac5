// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile edits as a pure transform over a loaded [`User`].

use crate::error::AppError;
use crate::models::{Location, Preferences, PreferencesPatch, User};
use chrono::{DateTime, Utc};

/// Validated profile changes. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub interests: Option<Vec<String>>,
    pub photos: Option<Vec<String>>,
    pub location: Option<Location>,
    pub preferences: Option<PreferencesPatch>,
}

/// Reject preference sets whose age window is empty.
pub fn check_preferences(preferences: &Preferences) -> Result<(), AppError> {
    if preferences.min_age > preferences.max_age {
        return Err(AppError::Validation(format!(
            "preferences.minAge ({}) exceeds preferences.maxAge ({})",
            preferences.min_age, preferences.max_age
        )));
    }
    Ok(())
}

impl ProfileUpdate {
    /// Produce the updated user; the caller persists it.
    pub fn apply(self, user: User, now: DateTime<Utc>) -> Result<User, AppError> {
        let preferences = match &self.preferences {
            Some(patch) => patch.apply_to(&user.preferences),
            None => user.preferences.clone(),
        };
        check_preferences(&preferences)?;

        Ok(User {
            first_name: self
                .first_name
                .map(|v| v.trim().to_string())
                .unwrap_or(user.first_name),
            last_name: self
                .last_name
                .map(|v| v.trim().to_string())
                .unwrap_or(user.last_name),
            bio: self.bio.unwrap_or(user.bio),
            interests: self
                .interests
                .map(|values| {
                    values
                        .into_iter()
                        .map(|v| v.trim().to_string())
                        .filter(|v| !v.is_empty())
                        .collect()
                })
                .unwrap_or(user.interests),
            photos: self.photos.unwrap_or(user.photos),
            location: self.location.unwrap_or(user.location),
            preferences,
            updated_at: now,
            ..user
        })
    }
}
