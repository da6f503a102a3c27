//! Request authentication middleware.
//!
//! Runs once per inbound request and never terminates one: every branch
//! calls through to the next handler, and route guards decide whether an
//! anonymous outcome is acceptable. Terminal outcomes per request are
//! authenticated (actor published as a request extension) or anonymous.

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, header};
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;

use super::actor::CurrentActor;
use super::cookie::{ACCESS_COOKIE_NAME, CookiePolicy, REFRESH_COOKIE_NAME, get_cookie};
use super::errors::AuthError;
use super::service::AuthService;

/// Paths that take credentials in their body instead of carrying them;
/// the middleware performs no token work for these. This is an explicit
/// allowlist, not an inference from route ordering.
pub const PUBLIC_API_PATHS: &[&str] = &[
    "/api/v1/users/signup",
    "/api/v1/users/login",
    "/api/v1/users/refresh",
];

/// State handed to the authentication layer.
#[derive(Clone)]
pub struct AuthLayerState {
    pub auth: Arc<AuthService>,
    pub cookies: CookiePolicy,
}

/// Credentials carried by a request. The bearer header wins over cookies
/// and carries no refresh token.
struct RequestTokens {
    access: Option<String>,
    refresh: Option<String>,
}

fn extract_tokens(headers: &HeaderMap) -> Option<RequestTokens> {
    if let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        if let Some(token) = value.strip_prefix("Bearer ") {
            return Some(RequestTokens {
                access: Some(token.to_string()),
                refresh: None,
            });
        }
    }

    let access = get_cookie(headers, ACCESS_COOKIE_NAME).map(str::to_string);
    let refresh = get_cookie(headers, REFRESH_COOKIE_NAME).map(str::to_string);
    if access.is_none() && refresh.is_none() {
        return None;
    }
    Some(RequestTokens { access, refresh })
}

fn append_set_cookie(response: &mut Response, cookie: &str) {
    if let Ok(value) = HeaderValue::from_str(cookie) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
}

/// Authenticate a request from its transported credentials.
///
/// State machine: skip public paths; try the access token; fall back to a
/// silent refresh (rotating the refresh slot and writing both new cookies on
/// the way out); on total failure clear both credential cookies.
pub async fn authenticate(
    State(state): State<AuthLayerState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    if !path.starts_with("/api/") || PUBLIC_API_PATHS.contains(&path) {
        return next.run(request).await;
    }

    let Some(tokens) = extract_tokens(request.headers()) else {
        // No credentials at all: anonymous, and no cookie writes.
        return next.run(request).await;
    };

    if let Some(access) = tokens.access.as_deref() {
        if let Some(actor) = state.auth.resolve_from_access_token(access) {
            request.extensions_mut().insert(actor);
            return next.run(request).await;
        }
    }

    if let Some(refresh) = tokens.refresh.as_deref() {
        match state.auth.refresh(refresh).await {
            Ok(outcome) => {
                // Silent re-authentication: the caller never sees a 401 for
                // an expired access token while the refresh slot is valid.
                request
                    .extensions_mut()
                    .insert(CurrentActor::from(&outcome.account));
                let mut response = next.run(request).await;
                append_set_cookie(
                    &mut response,
                    &state.cookies.set(
                        ACCESS_COOKIE_NAME,
                        &outcome.pair.access.token,
                        outcome.pair.access.max_age,
                    ),
                );
                append_set_cookie(
                    &mut response,
                    &state.cookies.set(
                        REFRESH_COOKIE_NAME,
                        &outcome.pair.refresh.token,
                        outcome.pair.refresh.max_age,
                    ),
                );
                return response;
            }
            Err(AuthError::InvalidToken) => {}
            Err(e) => {
                tracing::error!(error = %e, "Silent refresh failed");
            }
        }
    }

    // Credentials were presented but none held up: anonymous, and both
    // credential cookies are cleared.
    tracing::debug!(path = %request.uri().path(), "Request credentials rejected");
    let mut response = next.run(request).await;
    append_set_cookie(&mut response, &state.cookies.clear(ACCESS_COOKIE_NAME));
    append_set_cookie(&mut response, &state.cookies.clear(REFRESH_COOKIE_NAME));
    response
}
