//! Tag persistence.

use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct TagStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone)]
pub struct Tag {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
}

#[derive(sqlx::FromRow)]
struct TagRow {
    id: i64,
    category_id: i64,
    name: String,
}

impl From<TagRow> for Tag {
    fn from(row: TagRow) -> Self {
        Self {
            id: row.id,
            category_id: row.category_id,
            name: row.name,
        }
    }
}

impl TagStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a tag. Returns the new tag.
    pub async fn create(&self, category_id: i64, name: &str) -> Result<Tag, sqlx::Error> {
        let result = sqlx::query("INSERT INTO tags (category_id, name) VALUES (?, ?)")
            .bind(category_id)
            .bind(name)
            .execute(&self.pool)
            .await?;
        self.get(result.last_insert_rowid())
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Get a tag by id.
    pub async fn get(&self, id: i64) -> Result<Option<Tag>, sqlx::Error> {
        let row: Option<TagRow> =
            sqlx::query_as("SELECT id, category_id, name FROM tags WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Tag::from))
    }

    /// List all tags of a category.
    pub async fn list(&self, category_id: i64) -> Result<Vec<Tag>, sqlx::Error> {
        let rows: Vec<TagRow> = sqlx::query_as(
            "SELECT id, category_id, name FROM tags WHERE category_id = ? ORDER BY id",
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Tag::from).collect())
    }

    /// Rename a tag.
    pub async fn rename(&self, id: i64, name: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE tags SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a tag by id.
    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tags WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
