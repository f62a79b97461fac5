// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Proximity search.
//!
//! The store narrows candidates to a latitude band (plus gender, when
//! given); exact great-circle distance, age bounds, ordering and paging are
//! applied here.

use crate::db::{CandidateQuery, UserRepository};
use crate::error::AppError;
use crate::models::user::DEFAULT_DISTANCE_KM;
use crate::models::{Gender, Location, User};
use crate::time_utils::age_in_years;
use chrono::{DateTime, Utc};
use geo::{Distance, Haversine};

/// Mean earth radius used by `geo`'s haversine, in kilometres.
const MEAN_EARTH_RADIUS_KM: f64 = 6371.0088;
/// Slack added to the latitude band so float rounding never drops a
/// candidate sitting exactly on the radius.
const BAND_PADDING_DEGREES: f64 = 1e-3;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// Filters and paging for one search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCriteria {
    pub min_age: Option<u32>,
    pub max_age: Option<u32>,
    pub gender: Option<Gender>,
    pub max_distance_km: f64,
    pub page: u32,
    pub limit: u32,
}

impl SearchCriteria {
    /// Criteria with no filters and the requester's preferred radius.
    pub fn for_requester(requester: &User) -> Self {
        Self {
            min_age: None,
            max_age: None,
            gender: None,
            max_distance_km: preferred_distance_km(requester),
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }

    /// Latitude band that contains every point within `max_distance_km`.
    pub fn candidate_query(&self, origin: Location) -> CandidateQuery {
        let delta =
            (self.max_distance_km / MEAN_EARTH_RADIUS_KM).to_degrees() + BAND_PADDING_DEGREES;
        CandidateQuery {
            gender: self.gender,
            min_latitude: (origin.latitude - delta).max(-90.0),
            max_latitude: (origin.latitude + delta).min(90.0),
        }
    }
}

/// The requester's stored radius, or the service default when unset.
pub fn preferred_distance_km(requester: &User) -> f64 {
    let distance = requester.preferences.distance;
    if distance.is_finite() && distance > 0.0 {
        distance
    } else {
        DEFAULT_DISTANCE_KM
    }
}

/// One result with its distance from the requester.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub user: User,
    pub distance_km: f64,
}

/// One page of results.
#[derive(Debug, Clone)]
pub struct SearchPage {
    pub hits: Vec<SearchHit>,
    /// Matches across all pages
    pub total: usize,
    pub page: u32,
    pub limit: u32,
    pub pages: u32,
}

/// Great-circle distance in kilometres.
pub fn distance_km(a: Location, b: Location) -> f64 {
    Haversine.distance(a.point(), b.point()) / 1000.0
}

/// Filter, order and page a candidate list. Pure; `now` drives age math.
pub fn rank_candidates(
    requester: &User,
    candidates: Vec<User>,
    criteria: &SearchCriteria,
    now: DateTime<Utc>,
) -> SearchPage {
    let mut hits: Vec<SearchHit> = candidates
        .into_iter()
        .filter(|u| u.id != requester.id)
        .filter(|u| criteria.gender.map_or(true, |g| u.gender == g))
        .filter(|u| {
            let age = age_in_years(u.date_of_birth, now);
            criteria.min_age.map_or(true, |min| age >= min as i64)
                && criteria.max_age.map_or(true, |max| age <= max as i64)
        })
        .map(|user| {
            let distance_km = distance_km(requester.location, user.location);
            SearchHit { user, distance_km }
        })
        .filter(|hit| hit.distance_km <= criteria.max_distance_km)
        .collect();

    hits.sort_by(|a, b| {
        a.distance_km
            .total_cmp(&b.distance_km)
            .then_with(|| a.user.id.cmp(&b.user.id))
    });

    let total = hits.len();
    let limit = criteria.limit.max(1);
    let pages = total.div_ceil(limit as usize) as u32;

    let start = (criteria.page.max(1) as usize - 1).checked_mul(limit as usize);
    let hits = match start {
        Some(start) if start < hits.len() => hits
            .into_iter()
            .skip(start)
            .take(limit as usize)
            .collect(),
        _ => Vec::new(),
    };

    SearchPage {
        hits,
        total,
        page: criteria.page,
        limit,
        pages,
    }
}

/// Run a proximity search for `requester`.
pub async fn find_nearby(
    users: &dyn UserRepository,
    requester: &User,
    criteria: &SearchCriteria,
    now: DateTime<Utc>,
) -> Result<SearchPage, AppError> {
    let query = criteria.candidate_query(requester.location);
    let candidates = users.find_candidates(&query).await?;

    tracing::debug!(
        user_id = %requester.id,
        candidates = candidates.len(),
        max_distance_km = criteria.max_distance_km,
        "Ranking search candidates"
    );

    Ok(rank_candidates(requester, candidates, criteria, now))
}
