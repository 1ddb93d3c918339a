use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::api::json::AppJson;
use crate::api::MessageResponse;
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::{
    Lecture, LectureCompletion, LectureRequest, LectureWithTopics, Topic, TopicCompletion, TopicRequest,
    TopicWithCompletion,
};
use crate::services::{CurriculumService, ProgressService};
use crate::state::AppState;

pub async fn list_lectures(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<Vec<LectureWithTopics>>, AppError> {
    let lectures = CurriculumService::new(state.db).lectures(&course_id).await?;
    Ok(Json(lectures))
}

pub async fn create_lecture(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<String>,
    AppJson(req): AppJson<LectureRequest>,
) -> Result<(StatusCode, Json<Lecture>), AppError> {
    let lecture = CurriculumService::new(state.db)
        .create_lecture(&user.identity(), &course_id, req)
        .await?;
    Ok((StatusCode::CREATED, Json(lecture)))
}

pub async fn update_lecture(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    AppJson(req): AppJson<LectureRequest>,
) -> Result<Json<Lecture>, AppError> {
    let lecture = CurriculumService::new(state.db)
        .update_lecture(&user.identity(), &id, req)
        .await?;
    Ok(Json(lecture))
}

pub async fn delete_lecture(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    CurriculumService::new(state.db).delete_lecture(&user.identity(), &id).await?;
    Ok(Json(MessageResponse::new("Lecture deleted")))
}

pub async fn lecture_completion(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<LectureCompletion>, AppError> {
    let completion = ProgressService::new(state.db).is_lecture_complete(&user.id, &id).await?;
    Ok(Json(completion))
}

pub async fn list_topics(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<TopicWithCompletion>>, AppError> {
    let topics = ProgressService::new(state.db).topics_with_completion(&user.id, &id).await?;
    Ok(Json(topics))
}

pub async fn create_topic(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    AppJson(req): AppJson<TopicRequest>,
) -> Result<(StatusCode, Json<Topic>), AppError> {
    let topic = CurriculumService::new(state.db)
        .create_topic(&user.identity(), &id, req)
        .await?;
    Ok((StatusCode::CREATED, Json(topic)))
}

pub async fn complete_topic(
    State(state): State<AppState>,
    user: AuthUser,
    Path((lecture_id, topic_id)): Path<(String, String)>,
) -> Result<Json<TopicCompletion>, AppError> {
    let completion = ProgressService::new(state.db)
        .complete_topic(&user.identity(), &lecture_id, &topic_id)
        .await?;
    Ok(Json(completion))
}

pub async fn update_topic(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    AppJson(req): AppJson<TopicRequest>,
) -> Result<Json<Topic>, AppError> {
    let topic = CurriculumService::new(state.db)
        .update_topic(&user.identity(), &id, req)
        .await?;
    Ok(Json(topic))
}

pub async fn delete_topic(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    CurriculumService::new(state.db).delete_topic(&user.identity(), &id).await?;
    Ok(Json(MessageResponse::new("Topic deleted")))
}
