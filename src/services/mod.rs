// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod auth;
pub mod credentials;
pub mod session;

pub use auth::AuthService;
pub use credentials::{CredentialStore, PasswordCredential};
pub use session::{Claims, SessionIssuer, TokenPair};
