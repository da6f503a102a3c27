//! Post API.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};

use super::error::{ApiError, ResultExt};
use super::owned_category;
use crate::auth::Actor;
use crate::db::{Database, NewPost, Post};
use crate::impl_has_database;

#[derive(Clone)]
pub struct PostsState {
    pub db: Database,
}

impl_has_database!(PostsState);

pub fn router(state: PostsState) -> Router {
    Router::new()
        .route("/", post(create_post))
        .route("/list", get(list_posts))
        .route("/by-tab", get(get_post_by_tab))
        .route("/{id}", get(get_post))
        .route("/{id}", put(update_post))
        .route("/{id}", delete(delete_post))
        .with_state(state)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePostParams {
    category_id: i64,
    tab_id: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryParams {
    category_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TabParams {
    tab_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostBody {
    title: Option<String>,
    #[serde(default)]
    content: String,
    image_url: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PostResponse {
    id: i64,
    category_id: i64,
    tab_id: Option<i64>,
    title: Option<String>,
    content: String,
    image_url: Option<String>,
    created_at: String,
    updated_at: String,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            category_id: post.category_id,
            tab_id: post.tab_id,
            title: post.title,
            content: post.content,
            image_url: post.image_url,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

async fn create_post(
    State(state): State<PostsState>,
    Actor(account): Actor,
    Query(params): Query<CreatePostParams>,
    Json(payload): Json<PostBody>,
) -> Result<impl IntoResponse, ApiError> {
    owned_category(&state.db, params.category_id, account.id).await?;

    if let Some(tab_id) = params.tab_id {
        let tab = state
            .db
            .tabs()
            .get(tab_id)
            .await
            .db_err("Failed to get tab")?
            .ok_or_else(|| ApiError::not_found("Tab not found"))?;
        if tab.category_id != params.category_id {
            return Err(ApiError::bad_request("Tab belongs to another category"));
        }
    }

    let created = state
        .db
        .posts()
        .create(&NewPost {
            category_id: params.category_id,
            tab_id: params.tab_id,
            title: payload.title.as_deref(),
            content: &payload.content,
            image_url: payload.image_url.as_deref(),
        })
        .await
        .db_err("Failed to create post")?;

    Ok((StatusCode::CREATED, Json(PostResponse::from(created))))
}

async fn list_posts(
    State(state): State<PostsState>,
    Query(params): Query<CategoryParams>,
) -> Result<impl IntoResponse, ApiError> {
    let posts = state
        .db
        .posts()
        .list(params.category_id)
        .await
        .db_err("Failed to list posts")?;

    let responses: Vec<PostResponse> = posts.into_iter().map(PostResponse::from).collect();
    Ok(Json(responses))
}

async fn get_post(
    State(state): State<PostsState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let found = state
        .db
        .posts()
        .get(id)
        .await
        .db_err("Failed to get post")?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    Ok(Json(PostResponse::from(found)))
}

async fn get_post_by_tab(
    State(state): State<PostsState>,
    Query(params): Query<TabParams>,
) -> Result<impl IntoResponse, ApiError> {
    let found = state
        .db
        .posts()
        .get_by_tab(params.tab_id)
        .await
        .db_err("Failed to get post")?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    Ok(Json(PostResponse::from(found)))
}

async fn update_post(
    State(state): State<PostsState>,
    Actor(account): Actor,
    Path(id): Path<i64>,
    Json(payload): Json<PostBody>,
) -> Result<impl IntoResponse, ApiError> {
    let found = state
        .db
        .posts()
        .get(id)
        .await
        .db_err("Failed to get post")?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    owned_category(&state.db, found.category_id, account.id).await?;

    state
        .db
        .posts()
        .update(
            id,
            payload.title.as_deref(),
            &payload.content,
            payload.image_url.as_deref(),
        )
        .await
        .db_err("Failed to update post")?;

    Ok(Json(serde_json::json!({ "success": true })))
}

async fn delete_post(
    State(state): State<PostsState>,
    Actor(account): Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let found = state
        .db
        .posts()
        .get(id)
        .await
        .db_err("Failed to get post")?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    owned_category(&state.db, found.category_id, account.id).await?;

    state
        .db
        .posts()
        .delete(id)
        .await
        .db_err("Failed to delete post")?;

    Ok(Json(serde_json::json!({ "success": true })))
}
