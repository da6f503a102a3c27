pub mod api;
pub mod auth;
pub mod cli;
pub mod db;
pub mod jwt;
pub mod rate_limit;

use api::create_api_router;
use auth::{AuthLayerState, AuthService, CookiePolicy, SameSite, authenticate};
use axum::{Json, Router, middleware, routing::get};
use db::Database;
use jwt::TokenIssuer;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Server configuration assembled once at startup. Immutable afterward;
/// per-request state is limited to what the middleware publishes.
pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// JWT secret for signing tokens
    pub jwt_secret: Vec<u8>,
    /// Access token lifetime in seconds
    pub access_token_ttl: u64,
    /// Refresh token lifetime in seconds
    pub refresh_token_ttl: u64,
    /// Whether to set Secure flag on cookies (true in production with HTTPS)
    pub secure_cookies: bool,
    /// SameSite attribute for credential cookies
    pub cookie_same_site: SameSite,
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let issuer = Arc::new(TokenIssuer::new(
        &config.jwt_secret,
        config.access_token_ttl,
        config.refresh_token_ttl,
    ));
    let auth = Arc::new(AuthService::new(config.db.clone(), issuer));
    let cookies = CookiePolicy {
        secure: config.secure_cookies,
        same_site: config.cookie_same_site,
    };

    let api_router = create_api_router(config.db.clone(), auth.clone(), cookies);

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_router)
        .layer(middleware::from_fn_with_state(
            AuthLayerState { auth, cookies },
            authenticate,
        ))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Run the server on the given listener. This function blocks until the server exits.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    let make_service = app.into_make_service_with_connect_info::<std::net::SocketAddr>();
    axum::serve(listener, make_service).await
}
