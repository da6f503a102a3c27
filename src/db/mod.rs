mod account;
mod category;
mod post;
mod tab;
mod tag;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

pub use account::{Account, AccountRole, AccountStore, NewAccount};
pub use category::{Category, CategoryStore};
pub use post::{NewPost, Post, PostStore};
pub use tab::{BasicPanel, Tab, TabStore};
pub use tag::{Tag, TagStore};

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open or create a database at the given path.
    /// Use ":memory:" for an in-memory database.
    pub async fn open(path: &str) -> Result<Self, sqlx::Error> {
        // An in-memory database exists per connection, so the pool must not
        // hand out more than one.
        let (url, max_connections) = if path == ":memory:" {
            ("sqlite::memory:".to_string(), 1)
        } else {
            (format!("sqlite:{}?mode=rwc", path), 5)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(&url)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Get the current schema version.
    async fn get_version(&self) -> Result<i32, sqlx::Error> {
        let result: Option<(i32,)> = sqlx::query_as("SELECT version FROM schema_version LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(result.map(|r| r.0).unwrap_or(0))
    }

    /// Set the schema version within a transaction.
    async fn set_version(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        version: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM schema_version")
            .execute(&mut **tx)
            .await?;
        sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
            .bind(version)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Run database migrations.
    async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::query("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)")
            .execute(&self.pool)
            .await?;

        let version = self.get_version().await?;

        if version < 1 {
            self.migrate_v1().await?;
        }

        Ok(())
    }

    /// Execute a list of queries in a transaction, then set the version.
    async fn run_migration(
        &self,
        version: i32,
        queries: &[&'static str],
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        for query in queries {
            sqlx::query(*query).execute(&mut *tx).await?;
        }
        Self::set_version(&mut tx, version).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn migrate_v1(&self) -> Result<(), sqlx::Error> {
        self.run_migration(
            1,
            &[
                // Accounts table. refresh_token is the single currently-valid
                // refresh credential slot; NULL means no active session.
                "CREATE TABLE accounts (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    login_id TEXT UNIQUE NOT NULL COLLATE NOCASE,
                    email TEXT UNIQUE NOT NULL COLLATE NOCASE,
                    password_hash TEXT NOT NULL,
                    nickname TEXT NOT NULL,
                    role TEXT NOT NULL DEFAULT 'user',
                    image_url TEXT,
                    bio TEXT,
                    refresh_token TEXT,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_accounts_login_id ON accounts(login_id)",
                "CREATE INDEX idx_accounts_email ON accounts(email)",
                "CREATE INDEX idx_accounts_refresh_token ON accounts(refresh_token)",
                // Categories table
                "CREATE TABLE categories (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    public_id TEXT UNIQUE NOT NULL,
                    account_id INTEGER NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
                    title TEXT NOT NULL,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_categories_public_id ON categories(public_id)",
                "CREATE INDEX idx_categories_account_id ON categories(account_id)",
                // Fixed two-pane panel every category starts with
                "CREATE TABLE basic_panels (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    category_id INTEGER UNIQUE NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
                    intro_title TEXT NOT NULL,
                    resources_title TEXT NOT NULL,
                    intro_content TEXT NOT NULL,
                    resources_content TEXT NOT NULL
                )",
                // Custom tabs
                "CREATE TABLE tabs (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
                    name TEXT NOT NULL,
                    content TEXT NOT NULL DEFAULT '',
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_tabs_category_id ON tabs(category_id)",
                // Posts table
                "CREATE TABLE posts (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
                    tab_id INTEGER REFERENCES tabs(id) ON DELETE SET NULL,
                    title TEXT,
                    content TEXT NOT NULL DEFAULT '',
                    image_url TEXT,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_posts_category_id ON posts(category_id)",
                "CREATE INDEX idx_posts_tab_id ON posts(tab_id)",
                // Tags table
                "CREATE TABLE tags (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
                    name TEXT NOT NULL,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_tags_category_id ON tags(category_id)",
            ],
        )
        .await
    }

    /// Get the account store.
    pub fn accounts(&self) -> AccountStore {
        AccountStore::new(self.pool.clone())
    }

    /// Get the category store.
    pub fn categories(&self) -> CategoryStore {
        CategoryStore::new(self.pool.clone())
    }

    /// Get the tab store.
    pub fn tabs(&self) -> TabStore {
        TabStore::new(self.pool.clone())
    }

    /// Get the post store.
    pub fn posts(&self) -> PostStore {
        PostStore::new(self.pool.clone())
    }

    /// Get the tag store.
    pub fn tags(&self) -> TagStore {
        TagStore::new(self.pool.clone())
    }

    /// Get the underlying connection pool (for tests that need raw SQL access).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Begin a new transaction.
    pub async fn begin(&self) -> Result<sqlx::Transaction<'_, sqlx::Sqlite>, sqlx::Error> {
        self.pool.begin().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_account<'a>(login_id: &'a str, email: &'a str) -> NewAccount<'a> {
        NewAccount {
            login_id,
            email,
            password_hash: "$argon2id$stub",
            nickname: "tester",
            image_url: None,
            bio: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_account() {
        let db = Database::open(":memory:").await.unwrap();

        let id = db
            .accounts()
            .create(&new_account("alice01", "alice@example.com"))
            .await
            .unwrap();

        let account = db
            .accounts()
            .find_by_login_id("alice01")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.id, id);
        assert_eq!(account.email, "alice@example.com");
        assert_eq!(account.role, AccountRole::User);
        assert!(account.refresh_token.is_none());

        let account = db.accounts().find_by_id(id).await.unwrap().unwrap();
        assert_eq!(account.login_id, "alice01");

        let account = db
            .accounts()
            .find_by_email("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.id, id);
    }

    #[tokio::test]
    async fn test_duplicate_login_id_fails() {
        let db = Database::open(":memory:").await.unwrap();

        db.accounts()
            .create(&new_account("alice01", "a@example.com"))
            .await
            .unwrap();
        let result = db
            .accounts()
            .create(&new_account("alice01", "b@example.com"))
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_email_fails() {
        let db = Database::open(":memory:").await.unwrap();

        db.accounts()
            .create(&new_account("alice01", "a@example.com"))
            .await
            .unwrap();
        let result = db
            .accounts()
            .create(&new_account("bob02", "a@example.com"))
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_category_starts_with_basic_panel() {
        let db = Database::open(":memory:").await.unwrap();

        let account_id = db
            .accounts()
            .create(&new_account("alice01", "a@example.com"))
            .await
            .unwrap();

        let category = db
            .categories()
            .create(account_id, "First project")
            .await
            .unwrap();

        let panel = db
            .tabs()
            .basic_panel(category.id)
            .await
            .unwrap()
            .expect("panel created with category");
        assert_eq!(panel.intro_title, "Introduction");
        assert_eq!(panel.resources_title, "Resources");
    }

    #[tokio::test]
    async fn test_delete_category_removes_children() {
        let db = Database::open(":memory:").await.unwrap();

        let account_id = db
            .accounts()
            .create(&new_account("alice01", "a@example.com"))
            .await
            .unwrap();
        let category = db
            .categories()
            .create(account_id, "First project")
            .await
            .unwrap();
        let tab = db.tabs().create(category.id, "Notes").await.unwrap();
        db.tags().create(category.id, "rust").await.unwrap();
        db.posts()
            .create(&NewPost {
                category_id: category.id,
                tab_id: Some(tab.id),
                title: Some("hello"),
                content: "body",
                image_url: None,
            })
            .await
            .unwrap();

        db.categories().delete(category.id).await.unwrap();

        assert!(db.tabs().list(category.id).await.unwrap().is_empty());
        assert!(db.tags().list(category.id).await.unwrap().is_empty());
        assert!(db.posts().list(category.id).await.unwrap().is_empty());
        assert!(db.tabs().basic_panel(category.id).await.unwrap().is_none());
    }
}
