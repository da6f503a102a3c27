//! Per-request actor context and route guards.
//!
//! The middleware publishes the resolved identity as a request extension;
//! downstream handlers read it through the extractors here instead of any
//! process-global state. `Actor` re-fetches the full account row so handlers
//! see fresh data rather than stale claim-set fields.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::errors::GuardError;
use crate::db::{Account, AccountRole, Database};

/// Identity resolved by the authentication middleware for this request.
/// Claim-shaped: no storage lookup has happened yet.
#[derive(Debug, Clone)]
pub struct CurrentActor {
    pub account_id: i64,
    pub email: String,
    pub nickname: String,
    pub role: AccountRole,
}

impl From<&Account> for CurrentActor {
    fn from(account: &Account) -> Self {
        Self {
            account_id: account.id,
            email: account.email.clone(),
            nickname: account.nickname.clone(),
            role: account.role,
        }
    }
}

/// Trait for router state types that expose the database to the guards.
pub trait HasDatabase {
    fn db(&self) -> &Database;
}

/// Implement [`HasDatabase`] for a state struct with a `db: Database` field.
#[macro_export]
macro_rules! impl_has_database {
    ($state_type:ty) => {
        impl $crate::auth::HasDatabase for $state_type {
            fn db(&self) -> &$crate::db::Database {
                &self.db
            }
        }
    };
}

async fn fetch_actor_account<S>(parts: &Parts, state: &S) -> Result<Option<Account>, GuardError>
where
    S: HasDatabase + Send + Sync,
{
    let Some(current) = parts.extensions.get::<CurrentActor>() else {
        return Ok(None);
    };

    let account = state
        .db()
        .accounts()
        .find_by_id(current.account_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to load actor account");
            GuardError::Database
        })?;

    // The account vanished after the token was issued; the caller is treated
    // as unauthenticated, not as a server fault.
    Ok(account)
}

/// Guard for endpoints that require an authenticated caller.
pub struct Actor(pub Account);

impl<S> FromRequestParts<S> for Actor
where
    S: HasDatabase + Send + Sync,
{
    type Rejection = GuardError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        fetch_actor_account(parts, state)
            .await?
            .map(Actor)
            .ok_or(GuardError::NotAuthenticated)
    }
}

/// Optional guard - never fails, yields `None` for anonymous requests.
pub struct MaybeActor(pub Option<Account>);

impl<S> FromRequestParts<S> for MaybeActor
where
    S: HasDatabase + Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeActor(
            fetch_actor_account(parts, state).await.unwrap_or(None),
        ))
    }
}

/// Guard for administrator-only endpoints.
pub struct AdminActor(pub Account);

impl<S> FromRequestParts<S> for AdminActor
where
    S: HasDatabase + Send + Sync,
{
    type Rejection = GuardError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Actor(account) = Actor::from_request_parts(parts, state).await?;
        if account.role != AccountRole::Admin {
            return Err(GuardError::Forbidden);
        }
        Ok(AdminActor(account))
    }
}
