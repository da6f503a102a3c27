//! Post persistence.

use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct PostStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone)]
pub struct Post {
    pub id: i64,
    pub category_id: i64,
    pub tab_id: Option<i64>,
    pub title: Option<String>,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    category_id: i64,
    tab_id: Option<i64>,
    title: Option<String>,
    content: String,
    image_url: Option<String>,
    created_at: String,
    updated_at: String,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            category_id: row.category_id,
            tab_id: row.tab_id,
            title: row.title,
            content: row.content,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Fields required to create a post.
pub struct NewPost<'a> {
    pub category_id: i64,
    pub tab_id: Option<i64>,
    pub title: Option<&'a str>,
    pub content: &'a str,
    pub image_url: Option<&'a str>,
}

impl PostStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a post. Returns the new post.
    pub async fn create(&self, post: &NewPost<'_>) -> Result<Post, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO posts (category_id, tab_id, title, content, image_url) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(post.category_id)
        .bind(post.tab_id)
        .bind(post.title)
        .bind(post.content)
        .bind(post.image_url)
        .execute(&self.pool)
        .await?;
        self.get(result.last_insert_rowid())
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Get a post by id.
    pub async fn get(&self, id: i64) -> Result<Option<Post>, sqlx::Error> {
        let row: Option<PostRow> = sqlx::query_as(
            "SELECT id, category_id, tab_id, title, content, image_url, created_at, updated_at \
             FROM posts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Post::from))
    }

    /// List all posts of a category, newest first.
    pub async fn list(&self, category_id: i64) -> Result<Vec<Post>, sqlx::Error> {
        let rows: Vec<PostRow> = sqlx::query_as(
            "SELECT id, category_id, tab_id, title, content, image_url, created_at, updated_at \
             FROM posts WHERE category_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Post::from).collect())
    }

    /// Get the post bound to a tab, if any.
    pub async fn get_by_tab(&self, tab_id: i64) -> Result<Option<Post>, sqlx::Error> {
        let row: Option<PostRow> = sqlx::query_as(
            "SELECT id, category_id, tab_id, title, content, image_url, created_at, updated_at \
             FROM posts WHERE tab_id = ? ORDER BY id LIMIT 1",
        )
        .bind(tab_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Post::from))
    }

    /// Update a post's content fields.
    pub async fn update(
        &self,
        id: i64,
        title: Option<&str>,
        content: &str,
        image_url: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE posts SET title = ?, content = ?, image_url = ?, \
             updated_at = datetime('now') WHERE id = ?",
        )
        .bind(title)
        .bind(content)
        .bind(image_url)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a post by id.
    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
