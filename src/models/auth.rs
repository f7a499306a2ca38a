// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request and response bodies for the auth routes.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Body of `POST /auth/register`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserRegisterDto {
    #[validate(length(min = 1, max = 64, message = "userName must be 1-64 characters"))]
    pub user_name: String,
    #[validate(length(min = 1, max = 1024, message = "password must be 1-1024 characters"))]
    pub password: String,
}

/// Body of `POST /auth/login`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserLoginDto {
    #[validate(length(min = 1, max = 64, message = "userName must be 1-64 characters"))]
    pub user_name: String,
    #[validate(length(min = 1, max = 1024, message = "password must be 1-1024 characters"))]
    pub password: String,
}

/// Response of `GET /auth/me`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CurrentUser {
    pub id: i64,
    pub user_name: String,
}
