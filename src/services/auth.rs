// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Register, login and refresh: credentials and sessions wired to the user
//! store.

use crate::db::UserStore;
use crate::error::{AppError, Result};
use crate::models::{NewUser, User};
use crate::services::credentials::CredentialStore;
use crate::services::session::{SessionIssuer, TokenPair};

#[derive(Clone)]
pub struct AuthService {
    store: UserStore,
    credentials: CredentialStore,
    sessions: SessionIssuer,
}

impl AuthService {
    pub fn new(store: UserStore, signing_key: &[u8]) -> Self {
        Self {
            sessions: SessionIssuer::new(signing_key, store.clone()),
            credentials: CredentialStore::new(),
            store,
        }
    }

    pub fn sessions(&self) -> &SessionIssuer {
        &self.sessions
    }

    /// Create an account and return its numeric ID. Issues no tokens.
    pub async fn register(&self, user_name: &str, password: &str) -> Result<i64> {
        let user_name = user_name.trim();
        if user_name.is_empty() || password.is_empty() {
            return Err(AppError::BadRequest(
                "userName and password are required".to_string(),
            ));
        }

        if self.store.user_exists(user_name).await? {
            tracing::info!(user_name, "Registration rejected: name taken");
            return Err(AppError::UserAlreadyExists);
        }

        let credential = self.credentials.hash_password(password)?;
        let user = self
            .store
            .create_user(NewUser {
                user_name: user_name.to_string(),
                password_hash: credential.hash,
                password_salt: credential.salt,
            })
            .await?;

        tracing::info!(user_id = user.id, user_name, "User registered");
        Ok(user.id)
    }

    /// Check the password and start a fresh session.
    ///
    /// A wrong password leaves the stored session untouched.
    pub async fn login(&self, user_name: &str, password: &str) -> Result<TokenPair> {
        let user = self.authenticate(user_name, password).await?;
        self.sessions.rotate(&user).await
    }

    /// Rotate the session of an already identified user.
    pub async fn refresh_token(&self, user_id: i64, presented_token: &str) -> Result<TokenPair> {
        self.sessions.refresh(user_id, presented_token).await
    }

    async fn authenticate(&self, user_name: &str, password: &str) -> Result<User> {
        let user = self
            .store
            .find_by_user_name(user_name.trim())
            .await?
            .ok_or_else(|| {
                tracing::info!(user_name, "Login rejected: unknown user");
                AppError::UserNotFound
            })?;

        if !self
            .credentials
            .verify_password(password, &user.password_hash, &user.password_salt)
        {
            tracing::info!(user_id = user.id, "Login rejected: wrong password");
            return Err(AppError::WrongPassword);
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    const KEY: &[u8] = b"unit_test_signing_key_that_is_long_enough_for_hs512_use!!!!!!!!";

    fn service() -> (AuthService, UserStore) {
        let store = UserStore::in_memory();
        (AuthService::new(store.clone(), KEY), store)
    }

    #[tokio::test]
    async fn test_register_login_refresh() {
        let (auth, store) = service();

        let user_id = auth.register("alice", "pw123").await.unwrap();
        assert!(user_id > 0);

        let before = Utc::now();
        let login = auth.login("alice", "pw123").await.unwrap();
        assert!(!login.access_token.is_empty());
        assert!(login.refresh.expires_at >= before + Duration::days(7));
        assert!(login.refresh.expires_at <= Utc::now() + Duration::days(7));

        let claims = auth
            .sessions()
            .decode_access_token(&login.access_token, false)
            .unwrap();
        assert_eq!(claims.user_id(), Some(user_id));
        assert_eq!(claims.name, "alice");

        let refreshed = auth
            .refresh_token(user_id, &login.refresh.refresh_token)
            .await
            .unwrap();
        assert!(!refreshed.access_token.is_empty());
        assert!(refreshed.refresh.created_at >= login.refresh.created_at);

        let stored = store.get_user(user_id).await.unwrap().unwrap();
        assert_eq!(stored.session, Some(refreshed.refresh));
    }

    #[tokio::test]
    async fn test_wrong_password_does_not_touch_session() {
        let (auth, store) = service();
        let user_id = auth.register("alice", "pw123").await.unwrap();
        let login = auth.login("alice", "pw123").await.unwrap();

        let err = auth.login("alice", "wrongpw").await.unwrap_err();
        assert!(matches!(err, AppError::WrongPassword));

        let stored = store.get_user(user_id).await.unwrap().unwrap();
        assert_eq!(stored.session, Some(login.refresh));
    }

    #[tokio::test]
    async fn test_duplicate_registration_keeps_first_credential() {
        let (auth, store) = service();
        let user_id = auth.register("alice", "pw123").await.unwrap();
        let original = store.get_user(user_id).await.unwrap().unwrap();

        let err = auth.register("alice", "pw123").await.unwrap_err();
        assert!(matches!(err, AppError::UserAlreadyExists));
        let err = auth.register("ALICE", "other").await.unwrap_err();
        assert!(matches!(err, AppError::UserAlreadyExists));

        let after = store.get_user(user_id).await.unwrap().unwrap();
        assert_eq!(after.password_hash, original.password_hash);
        assert_eq!(after.password_salt, original.password_salt);
    }

    #[tokio::test]
    async fn test_login_is_case_insensitive() {
        let (auth, _store) = service();
        auth.register("Alice", "pw123").await.unwrap();
        assert!(auth.login("alice", "pw123").await.is_ok());
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let (auth, _store) = service();
        let err = auth.login("nobody", "pw").await.unwrap_err();
        assert!(matches!(err, AppError::UserNotFound));
    }

    #[tokio::test]
    async fn test_register_requires_input() {
        let (auth, _store) = service();
        assert!(matches!(
            auth.register("  ", "pw").await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            auth.register("alice", "").await,
            Err(AppError::BadRequest(_))
        ));
    }
}
