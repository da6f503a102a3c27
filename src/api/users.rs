//! User account API.
//!
//! - POST `/signup` - Register a new account
//! - GET `/check-email`, `/check-login-id` - Availability probes
//! - POST `/login` - Credential submission, returns and sets the token pair
//! - POST `/refresh` - Exchange the refresh cookie for a rotated pair
//! - POST `/logout` - Clear the refresh slot and both cookies
//! - GET `/me` - Current actor's profile

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    middleware,
    response::{AppendHeaders, IntoResponse},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::{ApiError, ResultExt};
use crate::auth::{
    ACCESS_COOKIE_NAME, Actor, AuthService, CookiePolicy, MaybeActor, REFRESH_COOKIE_NAME,
    TokenPair, get_cookie, hash_password,
};
use crate::db::{Account, Database, NewAccount};
use crate::impl_has_database;
use crate::rate_limit::{RateLimitConfig, rate_limit_login, rate_limit_signup};

#[derive(Clone)]
pub struct UsersState {
    pub db: Database,
    pub auth: Arc<AuthService>,
    pub cookies: CookiePolicy,
    pub rate_limits: Arc<RateLimitConfig>,
}

impl_has_database!(UsersState);

pub fn router(state: UsersState) -> Router {
    let signup_routes = Router::new()
        .route("/signup", post(signup))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state.rate_limits.clone(),
            rate_limit_signup,
        ));

    let login_routes = Router::new()
        .route("/login", post(login))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state.rate_limits.clone(),
            rate_limit_login,
        ));

    Router::new()
        .route("/check-email", get(check_email))
        .route("/check-login-id", get(check_login_id))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .with_state(state)
        .merge(signup_routes)
        .merge(login_routes)
}

// --- Request/Response types ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignupRequest {
    login_id: String,
    email: String,
    password: String,
    nickname: String,
    image_url: Option<String>,
    bio: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest {
    login_id: String,
    password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    login_id: String,
    email: String,
    nickname: String,
    role: crate::db::AccountRole,
    image_url: Option<String>,
    bio: Option<String>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            login_id: account.login_id,
            email: account.email,
            nickname: account.nickname,
            role: account.role,
            image_url: account.image_url,
            bio: account.bio,
        }
    }
}

#[derive(Deserialize)]
struct CheckEmailParams {
    email: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckLoginIdParams {
    login_id: String,
}

// --- Validation helpers ---

fn valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && email.chars().all(|c| !c.is_whitespace())
}

/// Password rule: at least 10 characters drawing on at least two of
/// letters, digits, and punctuation.
fn valid_password(password: &str) -> bool {
    if password.len() < 10 {
        return false;
    }
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| c.is_ascii_punctuation());
    [has_letter, has_digit, has_special]
        .iter()
        .filter(|b| **b)
        .count()
        >= 2
}

fn validate_login_id(login_id: &str) -> Result<(), ApiError> {
    if login_id.len() < 4 || login_id.len() > 50 {
        return Err(ApiError::bad_request(
            "Login id must be between 4 and 50 characters",
        ));
    }
    if !login_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ApiError::bad_request(
            "Login id can only contain letters, numbers, underscores, and dashes",
        ));
    }
    Ok(())
}

// --- Handlers ---

async fn signup(
    State(state): State<UsersState>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let login_id = payload.login_id.trim();
    let email = payload.email.trim();
    let nickname = payload.nickname.trim();

    validate_login_id(login_id)?;

    if !valid_email(email) {
        return Err(ApiError::bad_request("Invalid email format"));
    }

    if !valid_password(&payload.password) {
        return Err(ApiError::bad_request(
            "Password must be at least 10 characters and mix letters, numbers, or symbols",
        ));
    }

    if nickname.is_empty() || nickname.len() > 50 {
        return Err(ApiError::bad_request(
            "Nickname must be between 1 and 50 characters",
        ));
    }

    if state
        .db
        .accounts()
        .email_taken(email)
        .await
        .db_err("Failed to check email availability")?
    {
        return Err(ApiError::conflict("Email is already in use"));
    }

    if state
        .db
        .accounts()
        .login_id_taken(login_id)
        .await
        .db_err("Failed to check login id availability")?
    {
        return Err(ApiError::conflict("Login id is already in use"));
    }

    let password_hash = hash_password(&payload.password)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))?;

    let id = state
        .db
        .accounts()
        .create(&NewAccount {
            login_id,
            email,
            password_hash: &password_hash,
            nickname,
            image_url: payload.image_url.as_deref(),
            bio: payload.bio.as_deref(),
        })
        .await
        .db_err("Failed to create account")?;

    let account = state
        .db
        .accounts()
        .find_by_id(id)
        .await
        .db_err("Failed to load new account")?
        .ok_or_else(|| ApiError::internal("Account vanished after creation"))?;

    Ok((StatusCode::CREATED, Json(AccountResponse::from(account))))
}

async fn check_email(
    State(state): State<UsersState>,
    Query(params): Query<CheckEmailParams>,
) -> Result<impl IntoResponse, ApiError> {
    if !valid_email(&params.email) {
        return Err(ApiError::bad_request("Invalid email format"));
    }
    if state
        .db
        .accounts()
        .email_taken(&params.email)
        .await
        .db_err("Failed to check email availability")?
    {
        return Err(ApiError::conflict("Email is already in use"));
    }
    Ok(Json(serde_json::json!({ "available": true })))
}

async fn check_login_id(
    State(state): State<UsersState>,
    Query(params): Query<CheckLoginIdParams>,
) -> Result<impl IntoResponse, ApiError> {
    validate_login_id(params.login_id.trim())?;
    if state
        .db
        .accounts()
        .login_id_taken(params.login_id.trim())
        .await
        .db_err("Failed to check login id availability")?
    {
        return Err(ApiError::conflict("Login id is already in use"));
    }
    Ok(Json(serde_json::json!({ "available": true })))
}

/// Set-Cookie headers for a freshly issued pair.
fn pair_cookies(cookies: &CookiePolicy, pair: &TokenPair) -> AppendHeaders<[(axum::http::HeaderName, String); 2]> {
    AppendHeaders([
        (
            SET_COOKIE,
            cookies.set(ACCESS_COOKIE_NAME, &pair.access.token, pair.access.max_age),
        ),
        (
            SET_COOKIE,
            cookies.set(
                REFRESH_COOKIE_NAME,
                &pair.refresh.token,
                pair.refresh.max_age,
            ),
        ),
    ])
}

async fn login(
    State(state): State<UsersState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (_, pair) = state
        .auth
        .login(payload.login_id.trim(), &payload.password)
        .await?;

    Ok((
        StatusCode::OK,
        pair_cookies(&state.cookies, &pair),
        Json(TokenResponse {
            access_token: pair.access.token.clone(),
            refresh_token: pair.refresh.token.clone(),
        }),
    ))
}

/// Exchange the refresh cookie for a rotated pair. The presented refresh
/// token becomes permanently unusable.
async fn refresh(
    State(state): State<UsersState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let refresh_token = get_cookie(&headers, REFRESH_COOKIE_NAME)
        .ok_or_else(|| ApiError::unauthorized("No refresh token"))?;

    let outcome = state.auth.refresh(refresh_token).await?;

    Ok((
        StatusCode::OK,
        pair_cookies(&state.cookies, &outcome.pair),
        Json(TokenResponse {
            access_token: outcome.pair.access.token.clone(),
            refresh_token: outcome.pair.refresh.token.clone(),
        }),
    ))
}

/// Logout always succeeds: the refresh slot is cleared when a caller is
/// resolved, and both cookies are cleared either way.
async fn logout(
    State(state): State<UsersState>,
    MaybeActor(actor): MaybeActor,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(account) = actor {
        state.auth.logout(account.id).await?;
    }

    Ok((
        StatusCode::OK,
        AppendHeaders([
            (SET_COOKIE, state.cookies.clear(ACCESS_COOKIE_NAME)),
            (SET_COOKIE, state.cookies.clear(REFRESH_COOKIE_NAME)),
        ]),
        Json(serde_json::json!({ "success": true })),
    ))
}

async fn me(Actor(account): Actor) -> impl IntoResponse {
    Json(AccountResponse::from(account))
}
