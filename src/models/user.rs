// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User record and its embedded refresh session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User record stored in Firestore.
///
/// Only the credential and session fields are owned by this crate; the
/// game-facing parts of a user (characters, weapons) live elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Numeric user ID (also used as document ID)
    pub id: i64,
    /// Username as registered (lookups are case-insensitive)
    pub user_name: String,
    /// HMAC-SHA512 of the password, keyed by `password_salt`
    #[serde(with = "base64_bytes")]
    pub password_hash: Vec<u8>,
    /// Random per-user HMAC key
    #[serde(with = "base64_bytes")]
    pub password_salt: Vec<u8>,
    /// Current refresh session; `None` until the first login
    #[serde(default)]
    pub session: Option<Session>,
    /// When the account was registered
    pub created_at: DateTime<Utc>,
}

impl User {
    /// The stored refresh token, if any session was ever issued.
    pub fn refresh_token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.refresh_token.as_str())
    }
}

/// A single-slot refresh session. Issuing a new one overwrites the old.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque base64 token delivered in the `refreshToken` cookie
    pub refresh_token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session is no longer usable at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Fields needed to create a user; the store assigns the ID.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_name: String,
    pub password_hash: Vec<u8>,
    pub password_salt: Vec<u8>,
}

/// Username lookup key. Uniqueness is case-insensitive.
pub fn normalize_user_name(user_name: &str) -> String {
    user_name.trim().to_lowercase()
}

/// Serialize byte fields as base64 strings rather than integer arrays.
mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64.decode(encoded).map_err(serde::de::Error::custom)
    }
}
