use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::api::json::AppJson;
use crate::api::MessageResponse;
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::{Category, CategoryRequest, CategorySummary};
use crate::services::CategoryService;
use crate::state::AppState;

pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<CategorySummary>>, AppError> {
    let categories = CategoryService::new(state.db).list().await?;
    Ok(Json(categories))
}

pub async fn create_category(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let category = CategoryService::new(state.db).create(&user.identity(), req).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    AppJson(req): AppJson<CategoryRequest>,
) -> Result<Json<Category>, AppError> {
    let category = CategoryService::new(state.db).update(&user.identity(), &id, req).await?;
    Ok(Json(category))
}

pub async fn delete_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    CategoryService::new(state.db).delete(&user.identity(), &id).await?;
    Ok(Json(MessageResponse::new("Category deleted")))
}
