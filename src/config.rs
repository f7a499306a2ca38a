// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! The token signing key is the only required value: without it the server
//! could only issue unsigned or predictably signed tokens, so loading fails
//! and startup aborts.

use std::env;

/// Which user-record backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    Memory,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL (CORS origin, cookie `Secure` decision)
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// User-record backend
    pub store_backend: StoreBackend,

    // --- Secrets ---
    /// Symmetric key for signing access tokens (raw bytes)
    pub token_signing_key: Vec<u8>,
}

impl Config {
    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            store_backend: StoreBackend::Memory,
            token_signing_key: b"test_signing_key_64_bytes_minimum_for_hs512_signatures_padding!!"
                .to_vec(),
        }
    }

    /// Load configuration from environment variables, after loading `.env`
    /// if present.
    ///
    /// Fails with [`ConfigError::Missing`] if `TOKEN_SIGNING_KEY` is absent or
    /// blank.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a config from `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token_signing_key = lookup("TOKEN_SIGNING_KEY")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("TOKEN_SIGNING_KEY"))?
            .into_bytes();

        let store_backend = match lookup("USER_STORE").as_deref() {
            Some("memory") => StoreBackend::Memory,
            Some("firestore") | None => StoreBackend::Firestore,
            Some(other) => return Err(ConfigError::Invalid("USER_STORE", other.to_string())),
        };

        Ok(Self {
            frontend_url: lookup("FRONTEND_URL")
                .unwrap_or_else(|| "http://localhost:5173".to_string()),
            gcp_project_id: lookup("GCP_PROJECT_ID").unwrap_or_else(|| "local-dev".to_string()),
            port: lookup("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            store_backend,
            token_signing_key,
        })
    }

    /// Whether the refresh cookie should carry the `Secure` attribute.
    ///
    /// Only a plain-http localhost frontend opts out.
    pub fn secure_cookies(&self) -> bool {
        !(self.frontend_url.starts_with("http://localhost")
            || self.frontend_url.starts_with("http://127.0.0.1"))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
