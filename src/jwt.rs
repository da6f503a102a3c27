//! Token generation and validation for the dual-credential system.
//!
//! Access tokens are short-lived and self-contained: signature plus expiry,
//! no storage lookup. Refresh tokens are long-lived and only honored while
//! they match the single slot stored on the account.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::db::{Account, AccountRole};

/// Default access token lifetime: 1 hour.
pub const DEFAULT_ACCESS_TTL_SECS: u64 = 60 * 60;

/// Default refresh token lifetime: 7 days.
pub const DEFAULT_REFRESH_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Claims carried by an access token. Enough to authorize a request without
/// touching the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    /// Account id
    pub account_id: i64,
    /// Account email
    pub email: String,
    /// Display name
    pub nickname: String,
    /// Account role
    pub role: AccountRole,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Claims carried by a refresh token. Only enough to re-identify the
/// account, plus a unique id so consecutive tokens never collide.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshClaims {
    /// Unique token id; rotation must produce a distinct token even within
    /// the same second
    pub jti: String,
    /// Account id
    pub account_id: i64,
    /// Account email
    pub email: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// A freshly issued token along with its lifetime, for cookie Max-Age.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The signed token string
    pub token: String,
    /// Lifetime in seconds
    pub max_age: u64,
}

/// Signs and verifies tokens. Built once at startup from the configured
/// secret and lifetimes; there is no ambient secret lookup anywhere else.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: u64,
    refresh_ttl: u64,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], access_ttl: u64, refresh_ttl: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Issuer with the default lifetimes.
    pub fn with_default_ttls(secret: &[u8]) -> Self {
        Self::new(secret, DEFAULT_ACCESS_TTL_SECS, DEFAULT_REFRESH_TTL_SECS)
    }

    pub fn access_ttl(&self) -> u64 {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> u64 {
        self.refresh_ttl
    }

    /// Issue an access token for an account.
    pub fn issue_access(&self, account: &Account) -> Result<IssuedToken, TokenError> {
        let now = unix_now()?;
        let claims = AccessClaims {
            account_id: account.id,
            email: account.email.clone(),
            nickname: account.nickname.clone(),
            role: account.role,
            iat: now,
            exp: now + self.access_ttl,
        };
        self.encode(&claims, self.access_ttl)
    }

    /// Issue a refresh token for an account.
    pub fn issue_refresh(&self, account: &Account) -> Result<IssuedToken, TokenError> {
        let now = unix_now()?;
        let claims = RefreshClaims {
            jti: uuid::Uuid::new_v4().to_string(),
            account_id: account.id,
            email: account.email.clone(),
            iat: now,
            exp: now + self.refresh_ttl,
        };
        self.encode(&claims, self.refresh_ttl)
    }

    fn encode<T: Serialize>(&self, claims: &T, max_age: u64) -> Result<IssuedToken, TokenError> {
        let token = jsonwebtoken::encode(&Header::default(), claims, &self.encoding_key)
            .map_err(TokenError::Encoding)?;
        Ok(IssuedToken { token, max_age })
    }

    /// Validate and decode an access token.
    pub fn decode_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        self.decode(token)
    }

    /// Validate and decode a refresh token.
    pub fn decode_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        self.decode(token)
    }

    /// Whether a token carries a verifiable signature and an unexpired
    /// refresh-shaped claim set.
    pub fn is_valid_refresh(&self, token: &str) -> bool {
        self.decode_refresh(token).is_ok()
    }

    fn decode<T: for<'de> Deserialize<'de>>(&self, token: &str) -> Result<T, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = jsonwebtoken::decode::<T>(token, &self.decoding_key, &validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            },
        )?;
        Ok(data.claims)
    }
}

fn unix_now() -> Result<u64, TokenError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| TokenError::Clock)
}

/// Errors that can occur while issuing or decoding tokens.
#[derive(Debug)]
pub enum TokenError {
    /// Token structure could not be parsed
    Malformed,
    /// Signature did not verify
    InvalidSignature,
    /// Expiry has elapsed
    Expired,
    /// Error signing the token
    Encoding(jsonwebtoken::errors::Error),
    /// System clock is before the Unix epoch
    Clock,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Malformed => write!(f, "Malformed token"),
            TokenError::InvalidSignature => write!(f, "Invalid token signature"),
            TokenError::Expired => write!(f, "Token has expired"),
            TokenError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            TokenError::Clock => write!(f, "System time error"),
        }
    }
}

impl std::error::Error for TokenError {}
