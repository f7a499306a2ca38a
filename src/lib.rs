// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! rpg-auth: credential and session management for an RPG backend
//!
//! This crate provides account registration, password login, and
//! access/refresh token rotation for the game API. Characters, weapons and
//! combat live in other services and only consume the access tokens issued
//! here.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::UserStore;
use services::AuthService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: UserStore,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(config: Config, store: UserStore) -> Self {
        let auth = AuthService::new(store.clone(), &config.token_signing_key);
        Self {
            config,
            store,
            auth,
        }
    }
}
