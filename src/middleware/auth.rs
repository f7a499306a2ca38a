// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Authenticated user extracted from JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub user_name: String,
}

/// Middleware that requires a valid, unexpired access token.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_user = authenticate(&state, request.headers(), false)?;
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Middleware that establishes identity from a correctly signed access
/// token, expired or not. Only for the refresh endpoint, whose whole purpose
/// is replacing an expired access token.
pub async fn require_identity(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_user = authenticate(&state, request.headers(), true)?;
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
    allow_expired: bool,
) -> Result<AuthUser, AppError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;

    let claims = state
        .auth
        .sessions()
        .decode_access_token(token, allow_expired)?;

    let user_id = claims.user_id().ok_or(AppError::InvalidToken)?;

    Ok(AuthUser {
        user_id,
        user_name: claims.name,
    })
}
