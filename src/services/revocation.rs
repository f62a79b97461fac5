// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access-token blacklist.
//!
//! Revoked tokens are kept only until they would have expired anyway, so
//! entries carry a TTL and the registry never grows unbounded.

use crate::error::AppError;
use crate::time_utils::{system_clock, Clock};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use fred::clients::Pool;
use fred::prelude::*;
use fred::types::{Builder, Expiration};
use std::time::Duration;

/// Key prefix for blacklisted tokens.
const KEY_PREFIX: &str = "bl_";

fn blacklist_key(token: &str) -> String {
    format!("{}{}", KEY_PREFIX, token)
}

/// Registry of explicitly invalidated access tokens.
#[async_trait]
pub trait RevocationRegistry: Send + Sync {
    /// Record `token` as revoked for `ttl`.
    async fn revoke(&self, token: &str, ttl: Duration) -> Result<(), AppError>;

    /// `false` if the token was never revoked or its entry has expired.
    async fn is_revoked(&self, token: &str) -> Result<bool, AppError>;
}

// ─── Redis ────────────────────────────────────────────────────

/// Redis-backed registry using native key expiry.
pub struct RedisRevocationRegistry {
    pool: Pool,
}

impl RedisRevocationRegistry {
    pub async fn new(redis_url: &str) -> Result<Self, AppError> {
        let config = Config::from_url(redis_url)
            .map_err(|e| AppError::Database(format!("Invalid Redis URL: {}", e)))?;

        let pool = Builder::from_config(config)
            .with_connection_config(|cfg| {
                cfg.connection_timeout = Duration::from_secs(5);
                cfg.internal_command_timeout = Duration::from_secs(5);
            })
            .set_policy(ReconnectPolicy::new_exponential(0, 100, 5000, 2))
            .build_pool(4)
            .map_err(|e| AppError::Database(format!("Failed to build Redis pool: {}", e)))?;

        pool.init()
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Redis: {}", e)))?;

        tracing::info!("Connected to Redis");

        Ok(Self { pool })
    }
}

#[async_trait]
impl RevocationRegistry for RedisRevocationRegistry {
    async fn revoke(&self, token: &str, ttl: Duration) -> Result<(), AppError> {
        // EX 0 is rejected by Redis
        let seconds = ttl.as_secs().max(1) as i64;
        self.pool
            .set::<(), _, _>(
                blacklist_key(token),
                "true",
                Some(Expiration::EX(seconds)),
                None,
                false,
            )
            .await
            .map_err(|e| AppError::Database(format!("Redis SET failed: {}", e)))?;
        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, AppError> {
        let count: i64 = self
            .pool
            .exists(blacklist_key(token))
            .await
            .map_err(|e| AppError::Database(format!("Redis EXISTS failed: {}", e)))?;
        Ok(count > 0)
    }
}

// ─── In-memory ────────────────────────────────────────────────

/// Process-local registry for tests and single-instance development.
///
/// Expired entries are treated as absent. They are dropped on lookup and
/// swept on every `revoke`, so the map only holds live revocations.
pub struct MemoryRevocationRegistry {
    entries: DashMap<String, DateTime<Utc>>,
    clock: Clock,
}

impl Default for MemoryRevocationRegistry {
    fn default() -> Self {
        Self::with_clock(system_clock())
    }
}

impl MemoryRevocationRegistry {
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Number of entries currently held, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl RevocationRegistry for MemoryRevocationRegistry {
    async fn revoke(&self, token: &str, ttl: Duration) -> Result<(), AppError> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid TTL: {}", e)))?;
        let now = (self.clock)();
        self.entries.retain(|_, expires_at| *expires_at > now);
        self.entries.insert(token.to_string(), now + ttl);
        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, AppError> {
        let now = (self.clock)();
        let live = match self.entries.get(token) {
            Some(expires_at) => *expires_at > now,
            None => return Ok(false),
        };

        if !live {
            self.entries.remove_if(token, |_, expires_at| *expires_at <= now);
        }
        Ok(live)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn manual_clock() -> (Clock, Arc<Mutex<DateTime<Utc>>>) {
        let now = Arc::new(Mutex::new(Utc::now()));
        let handle = now.clone();
        (Arc::new(move || *handle.lock().unwrap()), now)
    }

    #[test]
    fn test_blacklist_key_prefix() {
        assert_eq!(blacklist_key("abc"), "bl_abc");
    }

    #[tokio::test]
    async fn test_unknown_token_not_revoked() {
        let registry = MemoryRevocationRegistry::default();
        assert!(!registry.is_revoked("never-seen").await.unwrap());
    }

    #[tokio::test]
    async fn test_revoked_until_ttl_elapses() {
        let (clock, now) = manual_clock();
        let registry = MemoryRevocationRegistry::with_clock(clock);

        registry
            .revoke("token-a", Duration::from_secs(900))
            .await
            .unwrap();
        assert!(registry.is_revoked("token-a").await.unwrap());
        assert!(!registry.is_revoked("token-b").await.unwrap());

        *now.lock().unwrap() += chrono::Duration::seconds(899);
        assert!(registry.is_revoked("token-a").await.unwrap());

        *now.lock().unwrap() += chrono::Duration::seconds(1);
        assert!(!registry.is_revoked("token-a").await.unwrap());
        assert!(registry.is_empty(), "expired entry should be purged");
    }

    #[tokio::test]
    async fn test_revoke_sweeps_expired_entries() {
        let (clock, now) = manual_clock();
        let registry = MemoryRevocationRegistry::with_clock(clock);

        for i in 0..1000 {
            registry
                .revoke(&format!("token-{}", i), Duration::from_secs(900))
                .await
                .unwrap();
        }
        assert_eq!(registry.len(), 1000);

        // None of the old tokens is ever looked up again
        *now.lock().unwrap() += chrono::Duration::hours(24);
        registry
            .revoke("fresh", Duration::from_secs(900))
            .await
            .unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.is_revoked("fresh").await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke_keeps_live_entries() {
        let (clock, now) = manual_clock();
        let registry = MemoryRevocationRegistry::with_clock(clock);

        registry
            .revoke("old", Duration::from_secs(900))
            .await
            .unwrap();
        *now.lock().unwrap() += chrono::Duration::seconds(600);
        registry
            .revoke("new", Duration::from_secs(900))
            .await
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.is_revoked("old").await.unwrap());
    }
}
