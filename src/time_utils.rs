// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time handling.

use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;

/// Source of "now". Injected so token expiry and age math can be tested.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Wall clock.
pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

const SECONDS_PER_YEAR: f64 = 365.25 * 24.0 * 60.0 * 60.0;

/// Age in whole years: `floor((now - birth) / 365.25 days)`.
///
/// Birth dates are taken as midnight UTC. Returns a negative value for
/// birth dates in the future.
pub fn age_in_years(birth: NaiveDate, now: DateTime<Utc>) -> i64 {
    let born = birth.and_time(chrono::NaiveTime::MIN).and_utc();
    let elapsed = now.signed_duration_since(born).num_seconds() as f64;
    (elapsed / SECONDS_PER_YEAR).floor() as i64
}

/// Inverse of [`age_in_years`]: the birth instant at which someone turns
/// exactly `years` at `now`.
pub fn birth_instant_for_age(years: u32, now: DateTime<Utc>) -> DateTime<Utc> {
    now - chrono::Duration::seconds((years as f64 * SECONDS_PER_YEAR) as i64)
}
