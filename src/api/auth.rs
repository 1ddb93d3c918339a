use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::api::json::AppJson;
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::{AuthResponse, LoginRequest, RegisterRequest, User};
use crate::services::AuthService;
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let response = AuthService::new(state.db, state.auth).register(req).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let response = AuthService::new(state.db, state.auth).login(req).await?;
    Ok(Json(response))
}

pub async fn me(State(state): State<AppState>, user: AuthUser) -> Result<Json<User>, AppError> {
    let me = AuthService::new(state.db, state.auth).me(&user.id).await?;
    Ok(Json(me))
}
