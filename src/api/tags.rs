//! Tag API.

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
use crate::db::{Database, Tag};
use crate::impl_has_database;

#[derive(Clone)]
pub struct TagsState {
    pub db: Database,
}

impl_has_database!(TagsState);

pub fn router(state: TagsState) -> Router {
    Router::new()
        .route("/", get(list_tags))
        .route("/", post(create_tag))
        .route("/{id}", put(rename_tag))
        .route("/{id}", delete(delete_tag))
        .with_state(state)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryParams {
    category_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TagRequest {
    name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TagResponse {
    id: i64,
    category_id: i64,
    name: String,
}

impl From<Tag> for TagResponse {
    fn from(tag: Tag) -> Self {
        Self {
            id: tag.id,
            category_id: tag.category_id,
            name: tag.name,
        }
    }
}

fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.is_empty() || name.len() > 30 {
        return Err(ApiError::bad_request(
            "Tag name must be between 1 and 30 characters",
        ));
    }
    Ok(())
}

async fn create_tag(
    State(state): State<TagsState>,
    Actor(account): Actor,
    Query(params): Query<CategoryParams>,
    Json(payload): Json<TagRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = payload.name.trim();
    validate_name(name)?;

    owned_category(&state.db, params.category_id, account.id).await?;

    let tag = state
        .db
        .tags()
        .create(params.category_id, name)
        .await
        .db_err("Failed to create tag")?;

    Ok((StatusCode::CREATED, Json(TagResponse::from(tag))))
}

async fn list_tags(
    State(state): State<TagsState>,
    Query(params): Query<CategoryParams>,
) -> Result<impl IntoResponse, ApiError> {
    let tags = state
        .db
        .tags()
        .list(params.category_id)
        .await
        .db_err("Failed to list tags")?;

    let responses: Vec<TagResponse> = tags.into_iter().map(TagResponse::from).collect();
    Ok(Json(responses))
}

async fn rename_tag(
    State(state): State<TagsState>,
    Actor(account): Actor,
    Path(id): Path<i64>,
    Json(payload): Json<TagRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = payload.name.trim();
    validate_name(name)?;

    let tag = state
        .db
        .tags()
        .get(id)
        .await
        .db_err("Failed to get tag")?
        .ok_or_else(|| ApiError::not_found("Tag not found"))?;

    owned_category(&state.db, tag.category_id, account.id).await?;

    state
        .db
        .tags()
        .rename(id, name)
        .await
        .db_err("Failed to rename tag")?;

    Ok(Json(serde_json::json!({ "success": true })))
}

async fn delete_tag(
    State(state): State<TagsState>,
    Actor(account): Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let tag = state
        .db
        .tags()
        .get(id)
        .await
        .db_err("Failed to get tag")?
        .ok_or_else(|| ApiError::not_found("Tag not found"))?;

    owned_category(&state.db, tag.category_id, account.id).await?;

    state
        .db
        .tags()
        .delete(id)
        .await
        .db_err("Failed to delete tag")?;

    Ok(Json(serde_json::json!({ "success": true })))
}
