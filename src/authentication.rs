use anyhow::{Context, Result};
use argon2::PasswordVerifier;
use argon2::{password_hash::SaltString, Argon2, PasswordHash};
use axum::extract::FromRequestParts;
use axum::headers::{Cookie, HeaderMapExt};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{db_helpers::get_user_by_id, errors::RequestError, models::User, AppState};

pub const SESSION_COOKIE: &str = "sessionid";
pub const LOGIN_URL: &str = "/auth/login/";
const SESSION_EXPIRY_DURATION: time::Duration = time::Duration::days(90);
const RESET_EXPIRY_DURATION: time::Duration = time::Duration::days(1);
const FINGERPRINT_LEN: usize = 16;

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct AuthClaim {
    id: i64,
    exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ResetClaim {
    id: i64,
    fp: String,
    exp: i64,
}

/// The logged-in user as seen by handlers and templates.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
}

pub struct MaybeUser(pub Option<AuthUser>);

/// Like [`MaybeUser`], but anonymous requests are redirected to the login
/// page with the requested path in `next`.
pub struct RequireUser(pub AuthUser);

#[axum::async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = RequestError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let token = match parts.headers.typed_get::<Cookie>() {
            Some(cookie) => cookie.get(SESSION_COOKIE).map(str::to_owned),
            None => None,
        };
        let Some(token) = token else {
            return Ok(MaybeUser(None));
        };
        let Some(id) = verify_session_token(&token, &state.config.secret_key) else {
            return Ok(MaybeUser(None));
        };
        let user = get_user_by_id(&state.pool, id).await?;
        Ok(MaybeUser(user.map(|user| AuthUser {
            id: user.id,
            username: user.username,
        })))
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for RequireUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let MaybeUser(user) = MaybeUser::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        match user {
            Some(user) => Ok(RequireUser(user)),
            None => {
                let next = parts
                    .uri
                    .path_and_query()
                    .map(|p| p.as_str())
                    .unwrap_or("/");
                Err(Redirect::to(&login_url(next)).into_response())
            }
        }
    }
}

/// `next` is percent-encoded so its own query survives; slashes stay readable.
pub fn login_url(next: &str) -> String {
    let next = urlencoding::encode(next).replace("%2F", "/");
    format!("{}?next={}", LOGIN_URL, next)
}

/// Only local absolute paths are accepted as a post-login destination.
pub fn safe_next_url(next: Option<&str>) -> &str {
    match next {
        Some(next) if next.starts_with('/') && !next.starts_with("//") && !next.contains('\\') => {
            next
        }
        _ => "/",
    }
}

pub fn session_cookie(token: &str) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        SESSION_EXPIRY_DURATION.whole_seconds()
    )
}

pub fn expired_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

// ----------------- Tokens -----------------

pub fn get_session_token(id: i64, secret: &str) -> Result<String> {
    let expiry_date = OffsetDateTime::now_utc() + SESSION_EXPIRY_DURATION;
    let claim = AuthClaim {
        id,
        exp: expiry_date.unix_timestamp(),
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claim,
        &jsonwebtoken::EncodingKey::from_secret(secret.as_ref()),
    )
    .context("Failed to generate session token")
}

pub fn verify_session_token(token: &str, secret: &str) -> Option<i64> {
    decode_claim::<AuthClaim>(token, secret).map(|claim| claim.id)
}

/// Reset tokens embed a fingerprint of the password hash, so changing the
/// password invalidates every token issued before.
pub fn get_reset_token(user: &User, secret: &str) -> Result<String> {
    let expiry_date = OffsetDateTime::now_utc() + RESET_EXPIRY_DURATION;
    let claim = ResetClaim {
        id: user.id,
        fp: password_fingerprint(&user.password).to_owned(),
        exp: expiry_date.unix_timestamp(),
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claim,
        &jsonwebtoken::EncodingKey::from_secret(secret.as_ref()),
    )
    .context("Failed to generate password reset token")
}

pub fn verify_reset_token(token: &str, secret: &str, user: &User) -> bool {
    match decode_claim::<ResetClaim>(token, secret) {
        Some(claim) => claim.id == user.id && claim.fp == password_fingerprint(&user.password),
        None => false,
    }
}

fn decode_claim<T: serde::de::DeserializeOwned>(token: &str, secret: &str) -> Option<T> {
    jsonwebtoken::decode::<T>(
        token,
        &jsonwebtoken::DecodingKey::from_secret(secret.as_ref()),
        &jsonwebtoken::Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| tracing::debug!("Rejected token: {}", e))
    .ok()
}

fn password_fingerprint(hash: &str) -> &str {
    hash.get(hash.len().saturating_sub(FINGERPRINT_LEN)..)
        .unwrap_or(hash)
}

// ----------------- Passwords -----------------

pub async fn verify_password_argon2(password: String, hash: &str) -> Result<bool> {
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || {
        let hash = PasswordHash::new(hash.as_str())
            .map_err(|_| anyhow::anyhow!("Failed to verify password"))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok())
    })
    .await
    .context("Failed to verify password")?
}

pub async fn hash_password_argon2(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(rand::thread_rng());
        let hash = PasswordHash::generate(Argon2::default(), password, salt.as_salt())
            .map_err(|_| anyhow::anyhow!("Failed to hash password"))?;
        Ok(hash.to_string())
    })
    .await
    .context("Failed to hash password")?
}
