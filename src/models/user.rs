// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Default search radius when neither the request nor the user's
/// preferences name one.
pub const DEFAULT_DISTANCE_KM: f64 = 50.0;
pub const DEFAULT_MIN_AGE: u32 = 18;
pub const DEFAULT_MAX_AGE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

/// Stored position. Kept as two named fields so the store can range-filter
/// on latitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub longitude: f64,
    pub latitude: f64,
}

impl Location {
    pub fn point(&self) -> geo::Point<f64> {
        geo::Point::new(self.longitude, self.latitude)
    }
}

/// GeoJSON point as exposed by the API: `{"type": "Point", "coordinates": [lng, lat]}`.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GeoJsonPoint {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub coordinates: [f64; 2],
}

impl From<Location> for GeoJsonPoint {
    fn from(location: Location) -> Self {
        Self {
            kind: "Point",
            coordinates: [location.longitude, location.latitude],
        }
    }
}

/// Search preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Preferences {
    pub min_age: u32,
    pub max_age: u32,
    /// Maximum search distance in kilometres
    pub distance: f64,
    #[serde(default)]
    pub gender_preference: Vec<Gender>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            min_age: DEFAULT_MIN_AGE,
            max_age: DEFAULT_MAX_AGE,
            distance: DEFAULT_DISTANCE_KM,
            gender_preference: Vec::new(),
        }
    }
}

/// Position as submitted by clients: `{"coordinates": [lng, lat]}`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LocationInput {
    #[validate(custom(function = "validate_coordinates"))]
    pub coordinates: [f64; 2],
}

impl From<&LocationInput> for Location {
    fn from(input: &LocationInput) -> Self {
        Self {
            longitude: input.coordinates[0],
            latitude: input.coordinates[1],
        }
    }
}

fn validate_coordinates(coordinates: &[f64; 2]) -> Result<(), ValidationError> {
    let [longitude, latitude] = *coordinates;
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(ValidationError::new("longitude_out_of_range"));
    }
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(ValidationError::new("latitude_out_of_range"));
    }
    Ok(())
}

/// Partial preferences; only supplied fields replace stored values.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesPatch {
    #[validate(range(min = 18, max = 100))]
    pub min_age: Option<u32>,
    #[validate(range(min = 18, max = 100))]
    pub max_age: Option<u32>,
    #[validate(range(min = 1.0, max = 1000.0))]
    pub distance: Option<f64>,
    pub gender_preference: Option<Vec<Gender>>,
}

impl PreferencesPatch {
    pub fn apply_to(&self, current: &Preferences) -> Preferences {
        Preferences {
            min_age: self.min_age.unwrap_or(current.min_age),
            max_age: self.max_age.unwrap_or(current.max_age),
            distance: self.distance.unwrap_or(current.distance),
            gender_preference: self
                .gender_preference
                .clone()
                .unwrap_or_else(|| current.gender_preference.clone()),
        }
    }
}

/// User document stored in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// UUID v4 (also used as document ID)
    pub id: String,
    /// Lowercased, trimmed email address
    pub email: String,
    /// Argon2 PHC string
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub photos: Vec<String>,
    pub location: Location,
    #[serde(default)]
    pub preferences: Preferences,
    pub last_active: DateTime<Utc>,
    #[serde(default)]
    pub is_verified: bool,
    /// Most recently issued refresh token; `None` when logged out.
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Trim and lowercase an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Short identity summary returned by register/login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserSummary {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

/// Profile as exposed by the API. Never carries the password hash or
/// refresh token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PublicProfile {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub bio: String,
    pub interests: Vec<String>,
    pub photos: Vec<String>,
    pub location: GeoJsonPoint,
    pub preferences: Preferences,
    pub last_active: DateTime<Utc>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for PublicProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            date_of_birth: user.date_of_birth,
            gender: user.gender,
            bio: user.bio.clone(),
            interests: user.interests.clone(),
            photos: user.photos.clone(),
            location: user.location.into(),
            preferences: user.preferences.clone(),
            last_active: user.last_active,
            is_verified: user.is_verified,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn test_geojson_point_orders_lng_lat() {
        let point: GeoJsonPoint = Location {
            longitude: -122.1,
            latitude: 37.4,
        }
        .into();
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["type"], "Point");
        assert_eq!(json["coordinates"][0], -122.1);
        assert_eq!(json["coordinates"][1], 37.4);
    }

    #[test]
    fn test_coordinates_validated() {
        let ok = LocationInput {
            coordinates: [180.0, -90.0],
        };
        assert!(ok.validate().is_ok());

        let bad_lng = LocationInput {
            coordinates: [180.5, 0.0],
        };
        assert!(bad_lng.validate().is_err());

        let bad_lat = LocationInput {
            coordinates: [0.0, 91.0],
        };
        assert!(bad_lat.validate().is_err());
    }

    #[test]
    fn test_preferences_patch_is_partial() {
        let patch = PreferencesPatch {
            max_age: Some(40),
            ..Default::default()
        };
        let merged = patch.apply_to(&Preferences::default());
        assert_eq!(merged.min_age, DEFAULT_MIN_AGE);
        assert_eq!(merged.max_age, 40);
        assert_eq!(merged.distance, DEFAULT_DISTANCE_KM);
    }

    #[test]
    fn test_preferences_patch_range_checked() {
        let patch = PreferencesPatch {
            min_age: Some(16),
            ..Default::default()
        };
        assert!(patch.validate().is_err());

        let patch = PreferencesPatch {
            distance: Some(5000.0),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn test_gender_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Gender::Female).unwrap(), "\"female\"");
        assert_eq!(Gender::Other.as_str(), "other");
    }
}
