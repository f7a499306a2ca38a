// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process user store backed by `DashMap`.

use crate::error::AppError;
use crate::models::user::normalize_user_name;
use crate::models::{NewUser, Session, User};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

pub struct MemoryDb {
    users: DashMap<i64, User>,
    /// Lowercased username -> user id
    names: DashMap<String, i64>,
    next_id: AtomicI64,
}

impl Default for MemoryDb {
    fn default() -> Self {
        Self {
            users: DashMap::new(),
            names: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl MemoryDb {
    pub fn get_user(&self, user_id: i64) -> Option<User> {
        self.users.get(&user_id).map(|u| u.clone())
    }

    pub fn find_by_user_name(&self, user_name: &str) -> Option<User> {
        let user_id = *self.names.get(&normalize_user_name(user_name))?;
        self.get_user(user_id)
    }

    pub fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        // Holding the name entry serializes racing registrations of one name.
        match self.names.entry(normalize_user_name(&new_user.user_name)) {
            Entry::Occupied(_) => Err(AppError::UserAlreadyExists),
            Entry::Vacant(slot) => {
                let user = User {
                    id: self.next_id.fetch_add(1, Ordering::Relaxed),
                    user_name: new_user.user_name,
                    password_hash: new_user.password_hash,
                    password_salt: new_user.password_salt,
                    session: None,
                    created_at: chrono::Utc::now(),
                };
                self.users.insert(user.id, user.clone());
                slot.insert(user.id);
                Ok(user)
            }
        }
    }

    pub fn replace_session(
        &self,
        user_id: i64,
        expected_token: Option<&str>,
        session: &Session,
    ) -> Result<(), AppError> {
        let mut user = self.users.get_mut(&user_id).ok_or(AppError::UserNotFound)?;
        if user.refresh_token() != expected_token {
            return Err(AppError::ConcurrentRefresh);
        }
        user.session = Some(session.clone());
        Ok(())
    }
}
