//! Rate limiting for the credential-accepting endpoints.
//!
//! Uses a token bucket per client IP to slow brute force attempts against
//! login and signup.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

/// Per-IP rate limiter.
pub type IpLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Rate limiting configuration for authentication endpoints.
#[derive(Clone)]
pub struct RateLimitConfig {
    /// Per-IP limiter for login attempts (10 per second)
    pub login: Arc<IpLimiter>,
    /// Per-IP limiter for signup (10 per minute)
    pub signup: Arc<IpLimiter>,
}

impl RateLimitConfig {
    pub fn new() -> Self {
        Self {
            login: Arc::new(RateLimiter::keyed(Quota::per_second(
                NonZeroU32::new(10).unwrap(),
            ))),
            signup: Arc::new(RateLimiter::keyed(Quota::per_minute(
                NonZeroU32::new(10).unwrap(),
            ))),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the client IP from X-Forwarded-For (reverse proxy) or the
/// connection info. Requests with neither share one bucket.
fn client_ip(request: &Request) -> String {
    if let Some(forwarded_for) = request.headers().get("x-forwarded-for") {
        if let Ok(value) = forwarded_for.to_str() {
            if let Some(first_ip) = value.split(',').next() {
                let ip = first_ip.trim();
                if !ip.is_empty() {
                    return ip.to_string();
                }
            }
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "local".to_string())
}

fn too_many_requests(message: &'static str) -> Response {
    (StatusCode::TOO_MANY_REQUESTS, message).into_response()
}

/// Middleware for rate limiting login attempts.
pub async fn rate_limit_login(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = client_ip(&request);
    match config.login.check_key(&ip) {
        Ok(_) => next.run(request).await,
        Err(_) => too_many_requests("Too many login attempts. Please wait before trying again."),
    }
}

/// Middleware for rate limiting signup.
pub async fn rate_limit_signup(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = client_ip(&request);
    match config.signup.check_key(&ip) {
        Ok(_) => next.run(request).await,
        Err(_) => too_many_requests("Too many signup attempts. Please wait before trying again."),
    }
}
