// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile, account and proximity search routes.

use axum::{
    extract::State,
    routing::{delete, get},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::{Validate, ValidationError};

use crate::error::{AppError, Result};
use crate::extract::{ValidatedJson, ValidatedQuery};
use crate::middleware::AuthUser;
use crate::models::{Gender, Location, LocationInput, PreferencesPatch, PublicProfile};
use crate::routes::MessageResponse;
use crate::services::search::{self, DEFAULT_LIMIT, DEFAULT_PAGE, MAX_LIMIT};
use crate::services::{ProfileUpdate, SearchCriteria};
use crate::AppState;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/account", delete(delete_account))
        .route("/search", get(search_users))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileResponse {
    pub message: String,
    pub user: PublicProfile,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, max = 50))]
    pub first_name: Option<String>,
    #[validate(length(min = 2, max = 50))]
    pub last_name: Option<String>,
    #[validate(length(max = 500))]
    pub bio: Option<String>,
    pub interests: Option<Vec<String>>,
    #[validate(custom(function = "validate_photo_urls"))]
    pub photos: Option<Vec<String>>,
    #[validate(nested)]
    pub location: Option<LocationInput>,
    #[validate(nested)]
    pub preferences: Option<PreferencesPatch>,
}

/// Photos are stored as links; anything that isn't an absolute http(s) URL
/// is rejected.
fn validate_photo_urls(photos: &Vec<String>) -> std::result::Result<(), ValidationError> {
    for url in photos {
        let rest = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"));
        match rest {
            Some(rest) if !rest.is_empty() && !rest.contains(char::is_whitespace) => {}
            _ => return Err(ValidationError::new("photo_url")),
        }
    }
    Ok(())
}

impl From<UpdateProfileRequest> for ProfileUpdate {
    fn from(req: UpdateProfileRequest) -> Self {
        Self {
            first_name: req.first_name,
            last_name: req.last_name,
            bio: req.bio,
            interests: req.interests,
            photos: req.photos,
            location: req.location.as_ref().map(Location::from),
            preferences: req.preferences,
        }
    }
}

/// Query parameters for `GET /search`.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_age_window"))]
pub struct SearchParams {
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,
    #[validate(range(exclusive_min = 0.0))]
    pub max_distance: Option<f64>,
    pub min_age: Option<u32>,
    pub max_age: Option<u32>,
    pub gender: Option<Gender>,
}

fn validate_age_window(params: &SearchParams) -> std::result::Result<(), ValidationError> {
    match (params.min_age, params.max_age) {
        (Some(min), Some(max)) if min > max => Err(ValidationError::new("min_age_exceeds_max_age")),
        _ => Ok(()),
    }
}

impl SearchParams {
    /// Fill unset fields from defaults and the requester's preferences.
    pub fn into_criteria(self, requester: &crate::models::User) -> SearchCriteria {
        let defaults = SearchCriteria::for_requester(requester);
        SearchCriteria {
            min_age: self.min_age,
            max_age: self.max_age,
            gender: self.gender,
            max_distance_km: self.max_distance.unwrap_or(defaults.max_distance_km),
            page: self.page.unwrap_or(DEFAULT_PAGE),
            limit: self.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SearchResult {
    #[serde(flatten)]
    pub profile: PublicProfile,
    pub distance_km: f64,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Pagination {
    pub total: usize,
    pub page: u32,
    pub pages: u32,
    pub limit: u32,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SearchResponse {
    pub message: String,
    pub users: Vec<SearchResult>,
    pub pagination: Pagination,
}

/// Return the caller's own profile.
async fn get_profile(Extension(auth): Extension<AuthUser>) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        message: "Profile retrieved successfully".to_string(),
        user: PublicProfile::from(&auth.user),
    })
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidatedJson(body): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>> {
    // Re-read so concurrent session changes (refresh token) are not clobbered
    let current = state
        .users
        .find_by_id(auth.user_id())
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

    let updated = ProfileUpdate::from(body).apply(current, state.sessions.now())?;
    state.users.update(&updated).await?;
    tracing::info!(user_id = %updated.id, "Profile updated");

    Ok(Json(ProfileResponse {
        message: "Profile updated successfully".to_string(),
        user: PublicProfile::from(&updated),
    }))
}

async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<MessageResponse>> {
    state.users.delete(auth.user_id()).await?;
    tracing::info!(user_id = %auth.user_id(), "Account deleted");

    Ok(MessageResponse::new("Account deleted successfully"))
}

/// Nearby users, closest first.
async fn search_users(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidatedQuery(params): ValidatedQuery<SearchParams>,
) -> Result<Json<SearchResponse>> {
    let criteria = params.into_criteria(&auth.user);
    let page = search::find_nearby(
        state.users.as_ref(),
        &auth.user,
        &criteria,
        state.sessions.now(),
    )
    .await?;

    let users = page
        .hits
        .iter()
        .map(|hit| SearchResult {
            profile: PublicProfile::from(&hit.user),
            distance_km: hit.distance_km,
        })
        .collect();

    Ok(Json(SearchResponse {
        message: "Users found successfully".to_string(),
        users,
        pagination: Pagination {
            total: page.total,
            page: page.page,
            pages: page.pages,
            limit: page.limit,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_urls_require_http_scheme() {
        assert!(validate_photo_urls(&vec!["https://cdn.example.com/a.jpg".to_string()]).is_ok());
        assert!(validate_photo_urls(&vec!["http://x".to_string()]).is_ok());
        assert!(validate_photo_urls(&vec!["ftp://x/a.jpg".to_string()]).is_err());
        assert!(validate_photo_urls(&vec!["https://".to_string()]).is_err());
        assert!(validate_photo_urls(&vec!["https://a b".to_string()]).is_err());
    }

    #[test]
    fn test_update_request_rejects_bad_photo() {
        let req = UpdateProfileRequest {
            photos: Some(vec!["not-a-url".to_string()]),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_search_params_reject_inverted_ages() {
        let params = SearchParams {
            min_age: Some(40),
            max_age: Some(30),
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_search_params_limit_capped() {
        let params = SearchParams {
            limit: Some(101),
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_search_params_parse_from_query() {
        let params: SearchParams =
            serde_json::from_value(serde_json::json!({"maxDistance": 1.5, "gender": "male"}))
                .unwrap();
        assert_eq!(params.max_distance, Some(1.5));
        assert_eq!(params.gender, Some(Gender::Male));
        assert!(params.validate().is_ok());
    }
}
