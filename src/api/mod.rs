mod categories;
mod error;
mod posts;
mod tabs;
mod tags;
mod users;

use axum::Router;
use std::sync::Arc;

use crate::auth::{AuthService, CookiePolicy};
use crate::db::{Category, Database};
use crate::rate_limit::RateLimitConfig;
use error::{ApiError, ResultExt};

pub use users::UsersState;

/// Create the `/api/v1` router.
pub fn create_api_router(db: Database, auth: Arc<AuthService>, cookies: CookiePolicy) -> Router {
    let users_state = users::UsersState {
        db: db.clone(),
        auth,
        cookies,
        rate_limits: Arc::new(RateLimitConfig::new()),
    };

    let categories_state = categories::CategoriesState { db: db.clone() };
    let tabs_state = tabs::TabsState { db: db.clone() };
    let posts_state = posts::PostsState { db: db.clone() };
    let tags_state = tags::TagsState { db };

    Router::new()
        .nest("/users", users::router(users_state))
        .nest("/categories", categories::router(categories_state))
        .nest("/tabs", tabs::router(tabs_state))
        .nest("/posts", posts::router(posts_state))
        .nest("/tags", tags::router(tags_state))
}

/// Load a category and verify the actor owns it. Foreign categories are
/// reported as not found rather than forbidden.
pub(crate) async fn owned_category(
    db: &Database,
    category_id: i64,
    account_id: i64,
) -> Result<Category, ApiError> {
    let category = db
        .categories()
        .get(category_id)
        .await
        .db_err("Failed to get category")?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;

    if category.account_id != account_id {
        return Err(ApiError::not_found("Category not found"));
    }

    Ok(category)
}
