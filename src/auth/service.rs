//! Login, refresh and logout orchestration.
//!
//! Verifies submitted credentials against the account store, issues token
//! pairs, and rotates the single refresh slot. Rotation is a storage-level
//! compare-and-swap: when two concurrent refresh calls present the same
//! token, exactly one wins and the loser sees `InvalidToken`.

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use std::sync::Arc;

use super::actor::CurrentActor;
use super::errors::AuthError;
use crate::db::{Account, Database};
use crate::jwt::{IssuedToken, TokenIssuer};

/// A freshly issued access/refresh pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

/// Result of a successful refresh: the account and its rotated pair.
pub struct RefreshOutcome {
    pub account: Account,
    pub pair: TokenPair,
}

/// Orchestrates credential checks and token issuance. Stateless per request;
/// the account store is the only shared mutable resource.
#[derive(Clone)]
pub struct AuthService {
    db: Database,
    issuer: Arc<TokenIssuer>,
}

impl AuthService {
    pub fn new(db: Database, issuer: Arc<TokenIssuer>) -> Self {
        Self { db, issuer }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Verify an identifier/password pair and issue a token pair.
    ///
    /// The identifier is an email when it contains an '@', a login handle
    /// otherwise. Unknown identifier and wrong password are indistinguishable
    /// to the caller. The new refresh token overwrites any prior slot value.
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<(Account, TokenPair), AuthError> {
        let Some(account) = self.db.accounts().find_by_identifier(identifier).await? else {
            tracing::warn!("login rejected");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &account.password_hash) {
            tracing::warn!(account_id = account.id, "login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let pair = self.issue_pair(&account)?;
        self.db
            .accounts()
            .set_refresh_token(account.id, &pair.refresh.token)
            .await?;

        tracing::info!(account_id = account.id, "login succeeded");
        Ok((account, pair))
    }

    /// Exchange a refresh token for a rotated access/refresh pair.
    ///
    /// The presented token must decode and must match the stored slot
    /// byte-for-byte; after rotation it is permanently unusable even though
    /// it has not expired.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshOutcome, AuthError> {
        if self.issuer.decode_refresh(refresh_token).is_err() {
            return Err(AuthError::InvalidToken);
        }

        let Some(account) = self
            .db
            .accounts()
            .find_by_refresh_token(refresh_token)
            .await?
        else {
            return Err(AuthError::InvalidToken);
        };

        let pair = self.issue_pair(&account)?;

        let rotated = self
            .db
            .accounts()
            .rotate_refresh_token(account.id, refresh_token, &pair.refresh.token)
            .await?;
        if !rotated {
            // A concurrent rotation or logout replaced the slot after our
            // lookup; this call loses.
            return Err(AuthError::InvalidToken);
        }

        tracing::debug!(account_id = account.id, "refresh token rotated");
        Ok(RefreshOutcome { account, pair })
    }

    /// Clear the refresh slot. Old refresh tokens fail permanently afterward.
    pub async fn logout(&self, account_id: i64) -> Result<(), AuthError> {
        self.db.accounts().clear_refresh_token(account_id).await?;
        tracing::info!(account_id, "logged out");
        Ok(())
    }

    /// Best-effort identity resolution from an access token. Any decode
    /// failure yields nothing; no storage lookup is performed.
    pub fn resolve_from_access_token(&self, token: &str) -> Option<CurrentActor> {
        let claims = self.issuer.decode_access(token).ok()?;
        Some(CurrentActor {
            account_id: claims.account_id,
            email: claims.email,
            nickname: claims.nickname,
            role: claims.role,
        })
    }

    fn issue_pair(&self, account: &Account) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access: self.issuer.issue_access(account).map_err(AuthError::Issuance)?,
            refresh: self
                .issuer
                .issue_refresh(account)
                .map_err(AuthError::Issuance)?,
        })
    }
}

/// Hash a password with Argon2id.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Verify a password against a stored Argon2 hash. Unparseable hashes count
/// as a mismatch.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
