// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Register, login and refresh-token routes.
//!
//! The access token travels in the JSON body. The refresh token only ever
//! travels in the HTTP-only `refreshToken` cookie, whose expiry matches the
//! stored session.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{CurrentUser, ServiceResponse, Session, UserLoginDto, UserRegisterDto};
use crate::time_utils::to_offset_date_time;
use crate::AppState;

/// Name of the cookie carrying the refresh token.
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Path the refresh cookie is scoped to.
const REFRESH_COOKIE_PATH: &str = "/auth";

/// Routes open to anonymous callers.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

/// Routes that need a signed (possibly expired) access token.
pub fn refresh_routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/refresh-token", post(refresh_token))
}

/// Routes that need an unexpired access token.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/me", get(current_user))
}

async fn register(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<UserRegisterDto>, JsonRejection>,
) -> Result<Json<ServiceResponse<i64>>> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let user_id = state
        .auth
        .register(&request.user_name, &request.password)
        .await?;

    Ok(Json(ServiceResponse::ok(user_id)))
}

async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    payload: std::result::Result<Json<UserLoginDto>, JsonRejection>,
) -> Result<(CookieJar, Json<ServiceResponse<String>>)> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let tokens = state
        .auth
        .login(&request.user_name, &request.password)
        .await?;

    let jar = jar.add(refresh_cookie(&tokens.refresh, state.config.secure_cookies()));
    Ok((jar, Json(ServiceResponse::ok(tokens.access_token))))
}

async fn refresh_token(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ServiceResponse<String>>)> {
    let presented = jar
        .get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or_else(|| {
            tracing::info!(user_id = identity.user_id, "Refresh rejected: no cookie");
            AppError::Unauthorized
        })?;

    let tokens = state
        .auth
        .refresh_token(identity.user_id, &presented)
        .await?;

    let jar = jar.add(refresh_cookie(&tokens.refresh, state.config.secure_cookies()));
    Ok((jar, Json(ServiceResponse::ok(tokens.access_token))))
}

async fn current_user(Extension(user): Extension<AuthUser>) -> Json<ServiceResponse<CurrentUser>> {
    Json(ServiceResponse::ok(CurrentUser {
        id: user.user_id,
        user_name: user.user_name,
    }))
}

/// Build the HTTP-only refresh cookie for a session.
fn refresh_cookie(session: &Session, secure: bool) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, session.refresh_token.clone()))
        .path(REFRESH_COOKIE_PATH)
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .expires(to_offset_date_time(session.expires_at))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn session() -> Session {
        let created_at = Utc::now();
        Session {
            refresh_token: "abc+/=".to_string(),
            created_at,
            expires_at: created_at + Duration::days(7),
        }
    }

    #[test]
    fn test_refresh_cookie_attributes() {
        let session = session();
        let cookie = refresh_cookie(&session, true);

        assert_eq!(cookie.name(), REFRESH_COOKIE);
        assert_eq!(cookie.value(), "abc+/=");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.path(), Some("/auth"));
        assert_eq!(
            cookie.expires_datetime().map(|t| t.unix_timestamp()),
            Some(session.expires_at.timestamp())
        );
    }

    #[test]
    fn test_refresh_cookie_insecure_for_local_dev() {
        let cookie = refresh_cookie(&session(), false);
        assert_eq!(cookie.secure(), Some(false));
    }
}
