// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer: user records with their credential and session fields.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{NewUser, Session, User};
use std::sync::Arc;

/// Collection names as constants.
pub mod collections {
    /// User records (keyed by numeric user id)
    pub const USERS: &str = "users";
    /// Lowercased username -> user id index (enforces uniqueness)
    pub const USER_NAMES: &str = "user_names";
}

/// User-record repository.
///
/// A concrete handle over either Firestore or an in-process map; cloning is
/// cheap and clones share the same data.
#[derive(Clone)]
pub struct UserStore {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    Firestore(FirestoreDb),
    Memory(Arc<MemoryDb>),
}

impl UserStore {
    pub fn firestore(db: FirestoreDb) -> Self {
        Self {
            backend: Backend::Firestore(db),
        }
    }

    /// An empty in-process store (tests and local development).
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(MemoryDb::default())),
        }
    }

    /// Get a user by numeric ID.
    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.get_user(user_id).await,
            Backend::Memory(db) => Ok(db.get_user(user_id)),
        }
    }

    /// Find a user by username, ignoring case.
    pub async fn find_by_user_name(&self, user_name: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.find_by_user_name(user_name).await,
            Backend::Memory(db) => Ok(db.find_by_user_name(user_name)),
        }
    }

    /// Whether a username is taken, ignoring case.
    pub async fn user_exists(&self, user_name: &str) -> Result<bool, AppError> {
        Ok(self.find_by_user_name(user_name).await?.is_some())
    }

    /// Insert a new user and assign its ID.
    ///
    /// Fails with [`AppError::UserAlreadyExists`] if the name is taken, even
    /// when two registrations race.
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.create_user(new_user).await,
            Backend::Memory(db) => db.create_user(new_user),
        }
    }

    /// Overwrite the user's refresh session.
    ///
    /// The write only happens if the stored refresh token still equals
    /// `expected_token` (`None` meaning no session was ever issued);
    /// otherwise [`AppError::ConcurrentRefresh`].
    pub async fn replace_session(
        &self,
        user_id: i64,
        expected_token: Option<&str>,
        session: &Session,
    ) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.replace_session(user_id, expected_token, session).await,
            Backend::Memory(db) => db.replace_session(user_id, expected_token, session),
        }
    }
}
