// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod auth;
pub mod service_response;
pub mod user;

pub use auth::{CurrentUser, UserLoginDto, UserRegisterDto};
pub use service_response::ServiceResponse;
pub use user::{NewUser, Session, User};
