// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod user;

pub use user::{
    Gender, Location, LocationInput, Preferences, PreferencesPatch, PublicProfile, User, UserSummary,
};
