use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use crate::api::json::AppJson;
use crate::api::MessageResponse;
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::{
    Course, CourseDetails, CoursePage, CourseQuery, Enrollment, NewCourseRequest, ProgressTopUp,
    RateCourseRequest, RatingSummary, UpdateCourseRequest, User,
};
use crate::services::{CourseService, EnrollmentService};
use crate::state::AppState;

pub async fn list_courses(
    State(state): State<AppState>,
    Query(query): Query<CourseQuery>,
) -> Result<Json<CoursePage>, AppError> {
    let page = CourseService::new(state.db).list(&query).await?;
    Ok(Json(page))
}

pub async fn create_course(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<NewCourseRequest>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let course = CourseService::new(state.db).create(&user.identity(), req).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

pub async fn course_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CourseDetails>, AppError> {
    let details = CourseService::new(state.db).details(&id).await?;
    Ok(Json(details))
}

pub async fn update_course(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    AppJson(req): AppJson<UpdateCourseRequest>,
) -> Result<Json<Course>, AppError> {
    let course = CourseService::new(state.db).update(&user.identity(), &id, req).await?;
    Ok(Json(course))
}

pub async fn delete_course(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    CourseService::new(state.db).delete(&user.identity(), &id).await?;
    Ok(Json(MessageResponse::new("Course deleted")))
}

pub async fn my_courses(State(state): State<AppState>, user: AuthUser) -> Result<Json<Vec<Course>>, AppError> {
    let courses = CourseService::new(state.db).mine(&user.identity()).await?;
    Ok(Json(courses))
}

pub async fn enroll(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<Enrollment>), AppError> {
    let enrollment = EnrollmentService::new(state.db).enroll(&user.identity(), &id).await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

pub async fn top_up_progress(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ProgressTopUp>, AppError> {
    let top_up = EnrollmentService::new(state.db)
        .top_up_progress(&user.identity(), &id)
        .await?;
    Ok(Json(top_up))
}

pub async fn course_students(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<User>>, AppError> {
    let students = CourseService::new(state.db).students(&user.identity(), &id).await?;
    Ok(Json(students))
}

pub async fn rate_course(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    AppJson(req): AppJson<RateCourseRequest>,
) -> Result<Json<RatingSummary>, AppError> {
    let summary = CourseService::new(state.db).rate(&user.identity(), &id, req).await?;
    Ok(Json(summary))
}
