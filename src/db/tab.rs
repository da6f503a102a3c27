//! Tab persistence: custom tabs plus the fixed intro/resources panel.

use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct TabStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone)]
pub struct Tab {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    pub content: String,
    pub created_at: String,
}

#[derive(sqlx::FromRow)]
struct TabRow {
    id: i64,
    category_id: i64,
    name: String,
    content: String,
    created_at: String,
}

impl From<TabRow> for Tab {
    fn from(row: TabRow) -> Self {
        Self {
            id: row.id,
            category_id: row.category_id,
            name: row.name,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

/// The fixed two-pane panel every category carries.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BasicPanel {
    pub category_id: i64,
    pub intro_title: String,
    pub resources_title: String,
    pub intro_content: String,
    pub resources_content: String,
}

impl TabStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a custom tab with empty content. Returns the new tab.
    pub async fn create(&self, category_id: i64, name: &str) -> Result<Tab, sqlx::Error> {
        let result = sqlx::query("INSERT INTO tabs (category_id, name) VALUES (?, ?)")
            .bind(category_id)
            .bind(name)
            .execute(&self.pool)
            .await?;
        self.get(result.last_insert_rowid())
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Get a tab by id.
    pub async fn get(&self, id: i64) -> Result<Option<Tab>, sqlx::Error> {
        let row: Option<TabRow> = sqlx::query_as(
            "SELECT id, category_id, name, content, created_at FROM tabs WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Tab::from))
    }

    /// List all custom tabs of a category, oldest first.
    pub async fn list(&self, category_id: i64) -> Result<Vec<Tab>, sqlx::Error> {
        let rows: Vec<TabRow> = sqlx::query_as(
            "SELECT id, category_id, name, content, created_at \
             FROM tabs WHERE category_id = ? ORDER BY created_at, id",
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Tab::from).collect())
    }

    /// Update a tab's name and content.
    pub async fn update(&self, id: i64, name: &str, content: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE tabs SET name = ?, content = ? WHERE id = ?")
            .bind(name)
            .bind(content)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a tab. Posts bound to it stay, detached.
    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE posts SET tab_id = NULL WHERE tab_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM tabs WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    /// Get the basic panel of a category.
    pub async fn basic_panel(&self, category_id: i64) -> Result<Option<BasicPanel>, sqlx::Error> {
        let row: Option<BasicPanel> = sqlx::query_as(
            "SELECT category_id, intro_title, resources_title, intro_content, resources_content \
             FROM basic_panels WHERE category_id = ?",
        )
        .bind(category_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Update the basic panel contents of a category.
    pub async fn update_basic_panel(
        &self,
        category_id: i64,
        intro_content: &str,
        resources_content: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE basic_panels SET intro_content = ?, resources_content = ? WHERE category_id = ?",
        )
        .bind(intro_content)
        .bind(resources_content)
        .bind(category_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
