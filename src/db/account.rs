//! Account persistence, including the single-slot refresh credential.
//!
//! At most one refresh token is valid per account at any instant. Rotation
//! is a conditional update keyed on the presented token so that concurrent
//! rotations cannot both succeed.

use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct AccountStore {
    pool: SqlitePool,
}

/// Account role for authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    User,
    Admin,
}

impl AccountRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountRole::User => "user",
            AccountRole::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "admin" => AccountRole::Admin,
            _ => AccountRole::User,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub login_id: String,
    pub email: String,
    pub password_hash: String,
    pub nickname: String,
    pub role: AccountRole,
    pub image_url: Option<String>,
    pub bio: Option<String>,
    pub refresh_token: Option<String>,
    pub created_at: String,
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: i64,
    login_id: String,
    email: String,
    password_hash: String,
    nickname: String,
    role: String,
    image_url: Option<String>,
    bio: Option<String>,
    refresh_token: Option<String>,
    created_at: String,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Self {
            id: row.id,
            login_id: row.login_id,
            email: row.email,
            password_hash: row.password_hash,
            nickname: row.nickname,
            role: AccountRole::from_str(&row.role),
            image_url: row.image_url,
            bio: row.bio,
            refresh_token: row.refresh_token,
            created_at: row.created_at,
        }
    }
}

/// Fields required to create an account.
pub struct NewAccount<'a> {
    pub login_id: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub nickname: &'a str,
    pub image_url: Option<&'a str>,
    pub bio: Option<&'a str>,
}

impl AccountStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new account with the ordinary user role. Returns the account id.
    pub async fn create(&self, account: &NewAccount<'_>) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO accounts (login_id, email, password_hash, nickname, image_url, bio) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(account.login_id)
        .bind(account.email)
        .bind(account.password_hash)
        .bind(account.nickname)
        .bind(account.image_url)
        .bind(account.bio)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Get an account by id.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Account>, sqlx::Error> {
        let row: Option<AccountRow> = sqlx::query_as(
            "SELECT id, login_id, email, password_hash, nickname, role, image_url, bio, \
             refresh_token, created_at FROM accounts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Account::from))
    }

    /// Get an account by login handle.
    pub async fn find_by_login_id(&self, login_id: &str) -> Result<Option<Account>, sqlx::Error> {
        let row: Option<AccountRow> = sqlx::query_as(
            "SELECT id, login_id, email, password_hash, nickname, role, image_url, bio, \
             refresh_token, created_at FROM accounts WHERE login_id = ?",
        )
        .bind(login_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Account::from))
    }

    /// Get an account by email.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Account>, sqlx::Error> {
        let row: Option<AccountRow> = sqlx::query_as(
            "SELECT id, login_id, email, password_hash, nickname, role, image_url, bio, \
             refresh_token, created_at FROM accounts WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Account::from))
    }

    /// Resolve a login identifier: email when it contains an '@', login
    /// handle otherwise.
    pub async fn find_by_identifier(&self, identifier: &str) -> Result<Option<Account>, sqlx::Error> {
        if identifier.contains('@') {
            self.find_by_email(identifier).await
        } else {
            self.find_by_login_id(identifier).await
        }
    }

    /// Get the account whose stored refresh slot matches the token exactly.
    pub async fn find_by_refresh_token(&self, token: &str) -> Result<Option<Account>, sqlx::Error> {
        let row: Option<AccountRow> = sqlx::query_as(
            "SELECT id, login_id, email, password_hash, nickname, role, image_url, bio, \
             refresh_token, created_at FROM accounts WHERE refresh_token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Account::from))
    }

    /// Overwrite the refresh slot unconditionally (login).
    pub async fn set_refresh_token(&self, id: i64, token: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE accounts SET refresh_token = ? WHERE id = ?")
            .bind(token)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Replace the refresh slot only if it still holds `presented`.
    /// Returns false when a concurrent rotation or logout got there first.
    pub async fn rotate_refresh_token(
        &self,
        id: i64,
        presented: &str,
        next: &str,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE accounts SET refresh_token = ? WHERE id = ? AND refresh_token = ?")
                .bind(next)
                .bind(id)
                .bind(presented)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Clear the refresh slot (logout).
    pub async fn clear_refresh_token(&self, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE accounts SET refresh_token = NULL WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Whether an email is already registered.
    pub async fn email_taken(&self, email: &str) -> Result<bool, sqlx::Error> {
        let count: (i32,) = sqlx::query_as("SELECT COUNT(*) FROM accounts WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 > 0)
    }

    /// Whether a login handle is already registered.
    pub async fn login_id_taken(&self, login_id: &str) -> Result<bool, sqlx::Error> {
        let count: (i32,) = sqlx::query_as("SELECT COUNT(*) FROM accounts WHERE login_id = ?")
            .bind(login_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 > 0)
    }

    /// Delete an account by id.
    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn store_with_account() -> (AccountStore, i64) {
        let db = Database::open(":memory:").await.unwrap();
        let store = db.accounts();
        let id = store
            .create(&NewAccount {
                login_id: "alice01",
                email: "alice@example.com",
                password_hash: "$argon2id$stub",
                nickname: "alice",
                image_url: None,
                bio: None,
            })
            .await
            .unwrap();
        (store, id)
    }

    #[tokio::test]
    async fn test_identifier_routing() {
        let (store, id) = store_with_account().await;

        let by_email = store
            .find_by_identifier("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, id);

        let by_handle = store.find_by_identifier("alice01").await.unwrap().unwrap();
        assert_eq!(by_handle.id, id);

        assert!(store.find_by_identifier("bob02").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refresh_lookup_is_exact_match() {
        let (store, id) = store_with_account().await;

        store.set_refresh_token(id, "token-one").await.unwrap();

        assert!(
            store
                .find_by_refresh_token("token-one")
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            store
                .find_by_refresh_token("token-on")
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            store
                .find_by_refresh_token("token-one ")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_rotation_is_conditional_on_presented_token() {
        let (store, id) = store_with_account().await;

        store.set_refresh_token(id, "first").await.unwrap();

        // Winning rotation replaces the slot.
        assert!(
            store
                .rotate_refresh_token(id, "first", "second")
                .await
                .unwrap()
        );

        // A second rotation presenting the superseded token loses.
        assert!(
            !store
                .rotate_refresh_token(id, "first", "third")
                .await
                .unwrap()
        );

        let account = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(account.refresh_token.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_clear_refresh_token() {
        let (store, id) = store_with_account().await;

        store.set_refresh_token(id, "first").await.unwrap();
        store.clear_refresh_token(id).await.unwrap();

        let account = store.find_by_id(id).await.unwrap().unwrap();
        assert!(account.refresh_token.is_none());
        assert!(!store.rotate_refresh_token(id, "first", "x").await.unwrap());
    }

    #[tokio::test]
    async fn test_uniqueness_probes() {
        let (store, _) = store_with_account().await;

        assert!(store.email_taken("alice@example.com").await.unwrap());
        assert!(!store.email_taken("bob@example.com").await.unwrap());
        assert!(store.login_id_taken("alice01").await.unwrap());
        assert!(!store.login_id_taken("bob02").await.unwrap());
    }
}
