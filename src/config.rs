// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honoured for local development.

use std::env;

/// Runtime environment; controls whether internal error causes are exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

/// Where user documents live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Firestore,
    /// Process-local maps; data is lost on restart.
    Memory,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Server port
    pub port: u16,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    pub environment: Environment,
    pub storage_backend: StorageBackend,
    /// GCP project ID (Firestore backend only)
    pub gcp_project_id: String,
    /// Redis URL for the token blacklist. In-memory blacklist when unset.
    pub redis_url: Option<String>,

    // --- Secrets ---
    /// HS256 key for access tokens (raw bytes)
    pub jwt_access_secret: Vec<u8>,
    /// HS256 key for refresh tokens; must differ from the access key
    pub jwt_refresh_secret: Vec<u8>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            port: 4000,
            frontend_url: "http://localhost:5173".to_string(),
            environment: Environment::Development,
            storage_backend: StorageBackend::Memory,
            gcp_project_id: "test-project".to_string(),
            redis_url: None,
            jwt_access_secret: b"test_access_key_32_bytes_minimum!".to_vec(),
            jwt_refresh_secret: b"test_refresh_key_32_bytes_minimum".to_vec(),
        }
    }
}

impl Config {
    /// Test configuration (alias for `Default`).
    pub fn test_default() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let environment = match env::var("APP_ENV").as_deref() {
            Ok("development") | Ok("dev") => Environment::Development,
            Ok("production") | Ok("prod") | Err(_) => Environment::Production,
            Ok(other) => return Err(ConfigError::Invalid("APP_ENV", other.to_string())),
        };

        let storage_backend = match env::var("STORAGE_BACKEND").as_deref() {
            Ok("firestore") | Err(_) => StorageBackend::Firestore,
            Ok("memory") => StorageBackend::Memory,
            Ok(other) => {
                return Err(ConfigError::Invalid(
                    "STORAGE_BACKEND",
                    other.to_string(),
                ))
            }
        };

        let gcp_project_id = match storage_backend {
            StorageBackend::Firestore => {
                env::var("GCP_PROJECT_ID").map_err(|_| ConfigError::Missing("GCP_PROJECT_ID"))?
            }
            StorageBackend::Memory => {
                env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string())
            }
        };

        let jwt_access_secret = read_secret("JWT_ACCESS_SECRET")?;
        let jwt_refresh_secret = read_secret("JWT_REFRESH_SECRET")?;
        if jwt_access_secret == jwt_refresh_secret {
            return Err(ConfigError::Invalid(
                "JWT_REFRESH_SECRET",
                "must differ from JWT_ACCESS_SECRET".to_string(),
            ));
        }

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .unwrap_or(4000),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            environment,
            storage_backend,
            gcp_project_id,
            redis_url: env::var("REDIS_URL")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            jwt_access_secret,
            jwt_refresh_secret,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

fn read_secret(name: &'static str) -> Result<Vec<u8>, ConfigError> {
    let value = env::var(name).map_err(|_| ConfigError::Missing(name))?;
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::Missing(name));
    }
    Ok(value.as_bytes().to_vec())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test touching process env so parallel tests cannot interleave.
    #[test]
    fn test_config_from_env() {
        env::set_var("STORAGE_BACKEND", "memory");
        env::set_var("APP_ENV", "development");
        env::set_var("JWT_ACCESS_SECRET", "access_secret_for_tests");
        env::set_var("JWT_REFRESH_SECRET", "refresh_secret_for_tests");
        env::remove_var("PORT");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.storage_backend, StorageBackend::Memory);
        assert!(config.is_development());
        assert_eq!(config.jwt_access_secret, b"access_secret_for_tests");
        assert_eq!(config.port, 4000);

        env::set_var("JWT_REFRESH_SECRET", "access_secret_for_tests");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("JWT_REFRESH_SECRET", _)));

        env::set_var("JWT_REFRESH_SECRET", "refresh_secret_for_tests");
        env::set_var("STORAGE_BACKEND", "mongodb");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("STORAGE_BACKEND", _)));
    }
}
