//! Tab API: custom tabs plus the fixed intro/resources panel per category.

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
use crate::db::{BasicPanel, Database, Tab};
use crate::impl_has_database;

#[derive(Clone)]
pub struct TabsState {
    pub db: Database,
}

impl_has_database!(TabsState);

pub fn router(state: TabsState) -> Router {
    Router::new()
        .route("/", get(list_tabs))
        .route("/", post(create_tab))
        .route("/basic", get(get_basic_panel))
        .route("/basic", put(update_basic_panel))
        .route("/{id}", put(update_tab))
        .route("/{id}", delete(delete_tab))
        .with_state(state)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryParams {
    category_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTabRequest {
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTabRequest {
    name: String,
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateBasicPanelRequest {
    intro_content: String,
    resources_content: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TabResponse {
    id: i64,
    category_id: i64,
    name: String,
    content: String,
    created_at: String,
}

impl From<Tab> for TabResponse {
    fn from(tab: Tab) -> Self {
        Self {
            id: tab.id,
            category_id: tab.category_id,
            name: tab.name,
            content: tab.content,
            created_at: tab.created_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BasicPanelResponse {
    intro_title: String,
    resources_title: String,
    intro_content: String,
    resources_content: String,
}

impl From<BasicPanel> for BasicPanelResponse {
    fn from(panel: BasicPanel) -> Self {
        Self {
            intro_title: panel.intro_title,
            resources_title: panel.resources_title,
            intro_content: panel.intro_content,
            resources_content: panel.resources_content,
        }
    }
}

async fn create_tab(
    State(state): State<TabsState>,
    Actor(account): Actor,
    Query(params): Query<CategoryParams>,
    Json(payload): Json<CreateTabRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = payload.name.trim();
    if name.is_empty() || name.len() > 50 {
        return Err(ApiError::bad_request(
            "Tab name must be between 1 and 50 characters",
        ));
    }

    owned_category(&state.db, params.category_id, account.id).await?;

    let tab = state
        .db
        .tabs()
        .create(params.category_id, name)
        .await
        .db_err("Failed to create tab")?;

    Ok((StatusCode::CREATED, Json(TabResponse::from(tab))))
}

async fn list_tabs(
    State(state): State<TabsState>,
    Query(params): Query<CategoryParams>,
) -> Result<impl IntoResponse, ApiError> {
    let tabs = state
        .db
        .tabs()
        .list(params.category_id)
        .await
        .db_err("Failed to list tabs")?;

    let responses: Vec<TabResponse> = tabs.into_iter().map(TabResponse::from).collect();
    Ok(Json(responses))
}

async fn update_tab(
    State(state): State<TabsState>,
    Actor(account): Actor,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateTabRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tab = state
        .db
        .tabs()
        .get(id)
        .await
        .db_err("Failed to get tab")?
        .ok_or_else(|| ApiError::not_found("Tab not found"))?;

    owned_category(&state.db, tab.category_id, account.id).await?;

    let name = payload.name.trim();
    if name.is_empty() || name.len() > 50 {
        return Err(ApiError::bad_request(
            "Tab name must be between 1 and 50 characters",
        ));
    }

    state
        .db
        .tabs()
        .update(id, name, &payload.content)
        .await
        .db_err("Failed to update tab")?;

    Ok(Json(serde_json::json!({ "success": true })))
}

async fn delete_tab(
    State(state): State<TabsState>,
    Actor(account): Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let tab = state
        .db
        .tabs()
        .get(id)
        .await
        .db_err("Failed to get tab")?
        .ok_or_else(|| ApiError::not_found("Tab not found"))?;

    owned_category(&state.db, tab.category_id, account.id).await?;

    state
        .db
        .tabs()
        .delete(id)
        .await
        .db_err("Failed to delete tab")?;

    Ok(Json(serde_json::json!({ "success": true })))
}

async fn get_basic_panel(
    State(state): State<TabsState>,
    Query(params): Query<CategoryParams>,
) -> Result<impl IntoResponse, ApiError> {
    let panel = state
        .db
        .tabs()
        .basic_panel(params.category_id)
        .await
        .db_err("Failed to get basic panel")?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;

    Ok(Json(BasicPanelResponse::from(panel)))
}

async fn update_basic_panel(
    State(state): State<TabsState>,
    Actor(account): Actor,
    Query(params): Query<CategoryParams>,
    Json(payload): Json<UpdateBasicPanelRequest>,
) -> Result<impl IntoResponse, ApiError> {
    owned_category(&state.db, params.category_id, account.id).await?;

    let updated = state
        .db
        .tabs()
        .update_basic_panel(
            params.category_id,
            &payload.intro_content,
            &payload.resources_content,
        )
        .await
        .db_err("Failed to update basic panel")?;

    if !updated {
        return Err(ApiError::not_found("Category not found"));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}
