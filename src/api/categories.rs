//! Category API.
//!
//! Reads are public so portfolio visitors can browse; mutations require the
//! authenticated owner.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};

use super::error::{ApiError, ResultExt};
use super::owned_category;
use crate::auth::Actor;
use crate::db::{Category, Database};
use crate::impl_has_database;

#[derive(Clone)]
pub struct CategoriesState {
    pub db: Database,
}

impl_has_database!(CategoriesState);

pub fn router(state: CategoriesState) -> Router {
    Router::new()
        .route("/", get(list_categories))
        .route("/", post(create_category))
        .route("/{id}", delete(delete_category))
        .with_state(state)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateCategoryRequest {
    title: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListCategoriesParams {
    account_id: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CategoryResponse {
    id: i64,
    public_id: String,
    title: String,
    created_at: String,
    updated_at: String,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            public_id: category.public_id,
            title: category.title,
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

async fn create_category(
    State(state): State<CategoriesState>,
    Actor(account): Actor,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = payload.title.trim();
    if title.is_empty() || title.len() > 100 {
        return Err(ApiError::bad_request(
            "Title must be between 1 and 100 characters",
        ));
    }

    let category = state
        .db
        .categories()
        .create(account.id, title)
        .await
        .db_err("Failed to create category")?;

    Ok((StatusCode::CREATED, Json(CategoryResponse::from(category))))
}

async fn list_categories(
    State(state): State<CategoriesState>,
    Query(params): Query<ListCategoriesParams>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = state
        .db
        .categories()
        .list_by_account(params.account_id)
        .await
        .db_err("Failed to list categories")?;

    let responses: Vec<CategoryResponse> =
        categories.into_iter().map(CategoryResponse::from).collect();
    Ok(Json(responses))
}

async fn delete_category(
    State(state): State<CategoriesState>,
    Actor(account): Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    owned_category(&state.db, id, account.id).await?;

    state
        .db
        .categories()
        .delete(id)
        .await
        .db_err("Failed to delete category")?;

    Ok(Json(serde_json::json!({ "success": true })))
}
