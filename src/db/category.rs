//! Category persistence. Every category belongs to one account and starts
//! with the fixed two-pane intro/resources panel.

use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct CategoryStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone)]
pub struct Category {
    pub id: i64,
    pub public_id: String,
    pub account_id: i64,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: i64,
    public_id: String,
    account_id: i64,
    title: String,
    created_at: String,
    updated_at: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            public_id: row.public_id,
            account_id: row.account_id,
            title: row.title,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl CategoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a category together with its basic panel, in one transaction.
    pub async fn create(&self, account_id: i64, title: &str) -> Result<Category, sqlx::Error> {
        let public_id = uuid::Uuid::new_v4().to_string();

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO categories (public_id, account_id, title) VALUES (?, ?, ?)",
        )
        .bind(&public_id)
        .bind(account_id)
        .bind(title)
        .execute(&mut *tx)
        .await?;
        let id = result.last_insert_rowid();

        sqlx::query(
            "INSERT INTO basic_panels (category_id, intro_title, resources_title, intro_content, resources_content) \
             VALUES (?, 'Introduction', 'Resources', '', '')",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get(id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Get a category by id.
    pub async fn get(&self, id: i64) -> Result<Option<Category>, sqlx::Error> {
        let row: Option<CategoryRow> = sqlx::query_as(
            "SELECT id, public_id, account_id, title, created_at, updated_at \
             FROM categories WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Category::from))
    }

    /// List all categories owned by an account, oldest first.
    pub async fn list_by_account(&self, account_id: i64) -> Result<Vec<Category>, sqlx::Error> {
        let rows: Vec<CategoryRow> = sqlx::query_as(
            "SELECT id, public_id, account_id, title, created_at, updated_at \
             FROM categories WHERE account_id = ? ORDER BY created_at, id",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// Delete a category and everything hanging off it.
    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM posts WHERE category_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM tags WHERE category_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM tabs WHERE category_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM basic_panels WHERE category_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
