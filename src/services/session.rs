// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access-token minting and refresh-token rotation.
//!
//! Access tokens are HS512 JWTs, valid for one hour and never stored.
//! Refresh tokens are 64 random bytes (base64), valid for seven days, and
//! live in a single slot on the user record: every login or refresh
//! overwrites the slot, so a rotated-out token can never be used again.

use crate::db::UserStore;
use crate::error::{AppError, Result};
use crate::models::{Session, User};
use crate::time_utils::format_utc_rfc3339;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

/// Access token lifetime.
pub const ACCESS_TOKEN_TTL_SECS: i64 = 60 * 60;

/// Refresh token lifetime.
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 7;

/// Random bytes behind each refresh token.
pub const REFRESH_TOKEN_BYTES: usize = 64;

const ALGORITHM: Algorithm = Algorithm::HS512;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (numeric user ID)
    pub sub: String,
    /// Username
    pub name: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

impl Claims {
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

/// Tokens handed out on a successful login or refresh.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    /// Goes back to the client only through the `refreshToken` cookie
    pub refresh: Session,
}

/// Mints, validates and rotates session tokens.
#[derive(Clone)]
pub struct SessionIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    store: UserStore,
    rng: SystemRandom,
}

impl SessionIssuer {
    pub fn new(signing_key: &[u8], store: UserStore) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(signing_key),
            decoding_key: DecodingKey::from_secret(signing_key),
            store,
            rng: SystemRandom::new(),
        }
    }

    /// Sign a one-hour access token for the user.
    pub fn issue_access_token(&self, user_id: i64, user_name: &str) -> Result<String> {
        let now = Utc::now().timestamp() as usize;

        let claims = Claims {
            sub: user_id.to_string(),
            name: user_name.to_string(),
            iat: now,
            exp: now + ACCESS_TOKEN_TTL_SECS as usize,
        };

        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))
    }

    /// Generate a fresh refresh session expiring exactly seven days from now.
    pub fn issue_refresh_token(&self) -> Result<Session> {
        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;

        let created_at = Utc::now();
        Ok(Session {
            refresh_token: BASE64.encode(bytes),
            created_at,
            expires_at: created_at + Duration::days(REFRESH_TOKEN_TTL_DAYS),
        })
    }

    /// Issue a new token pair and overwrite the user's stored session.
    ///
    /// The single path taken by both login and refresh. The store write is
    /// conditional on the session still being the one on `user`; a
    /// concurrent rotation makes this fail with `ConcurrentRefresh`.
    pub async fn rotate(&self, user: &User) -> Result<TokenPair> {
        let access_token = self.issue_access_token(user.id, &user.user_name)?;
        let refresh = self.issue_refresh_token()?;

        self.store
            .replace_session(user.id, user.refresh_token(), &refresh)
            .await?;

        tracing::info!(
            user_id = user.id,
            expires_at = %format_utc_rfc3339(refresh.expires_at),
            "Session rotated"
        );

        Ok(TokenPair {
            access_token,
            refresh,
        })
    }

    /// Exchange a live refresh session for a new token pair.
    ///
    /// `user_id` comes from an already verified access token, not from the
    /// opaque refresh token. Fails without touching the store when the
    /// session is missing or expired (`SessionExpired`) or when the presented
    /// token is not the current one (`InvalidToken`).
    pub async fn refresh(&self, user_id: i64, presented_token: &str) -> Result<TokenPair> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let session = match &user.session {
            Some(session) if !session.is_expired_at(Utc::now()) => session,
            Some(session) => {
                tracing::info!(
                    user_id,
                    expired_at = %format_utc_rfc3339(session.expires_at),
                    "Refresh rejected: session expired"
                );
                return Err(AppError::SessionExpired);
            }
            None => {
                tracing::info!(user_id, "Refresh rejected: no session issued");
                return Err(AppError::SessionExpired);
            }
        };

        let matches: bool = session
            .refresh_token
            .as_bytes()
            .ct_eq(presented_token.as_bytes())
            .into();
        if !matches {
            tracing::warn!(user_id, "Refresh rejected: token is not the current one");
            return Err(AppError::InvalidToken);
        }

        self.rotate(&user).await
    }

    /// Verify an access token's signature and return its claims.
    ///
    /// With `allow_expired`, a correctly signed token past its `exp` is still
    /// accepted as proof of identity (used by the refresh endpoint).
    pub fn decode_access_token(&self, token: &str, allow_expired: bool) -> Result<Claims> {
        let mut validation = Validation::new(ALGORITHM);
        if allow_expired {
            validation.validate_exp = false;
        }

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::InvalidToken)
    }
}
