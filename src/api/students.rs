use axum::Json;
use axum::extract::{Path, Query, State};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::{OverallProgress, Role, StudentProgress, StudentSearch};
use crate::services::{ProgressService, ReconcileService, ReconcileStats, StudentRemoval, StudentService};
use crate::state::AppState;

pub async fn list_students(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<StudentSearch>,
) -> Result<Json<Vec<StudentProgress>>, AppError> {
    user.require_role(Role::Admin)?;
    let report = ProgressService::new(state.db)
        .student_progress_report(params.search.as_deref(), false)
        .await?;
    Ok(Json(report))
}

pub async fn list_enrolled_students(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<StudentSearch>,
) -> Result<Json<Vec<StudentProgress>>, AppError> {
    user.require_role(Role::Admin)?;
    let report = ProgressService::new(state.db)
        .student_progress_report(params.search.as_deref(), true)
        .await?;
    Ok(Json(report))
}

pub async fn student_progress(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<OverallProgress>, AppError> {
    user.require_role(Role::Admin)?;
    let progress = ProgressService::new(state.db).student_progress(&id).await?;
    Ok(Json(progress))
}

pub async fn delete_student(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<StudentRemoval>, AppError> {
    let removal = StudentService::new(state.db).delete_student(&user.identity(), &id).await?;
    Ok(Json(removal))
}

pub async fn reconcile(State(state): State<AppState>, user: AuthUser) -> Result<Json<ReconcileStats>, AppError> {
    user.require_role(Role::Admin)?;
    let stats = ReconcileService::new(state.db).run().await?;
    Ok(Json(stats))
}
