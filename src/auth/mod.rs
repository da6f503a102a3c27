//! Dual-token authentication with silent re-authentication.
//!
//! Short-lived access tokens are self-verifying and never touch storage;
//! the long-lived refresh token occupies a single slot on the account and is
//! rotated on every use. The middleware bridges header and cookie transport
//! and publishes the resolved actor into per-request state.

mod actor;
mod cookie;
mod errors;
mod middleware;
mod service;

pub use actor::{Actor, AdminActor, CurrentActor, HasDatabase, MaybeActor};
pub use cookie::{ACCESS_COOKIE_NAME, CookiePolicy, REFRESH_COOKIE_NAME, SameSite, get_cookie};
pub use errors::{AuthError, GuardError};
pub use middleware::{AuthLayerState, PUBLIC_API_PATHS, authenticate};
pub use service::{AuthService, RefreshOutcome, TokenPair, hash_password, verify_password};
