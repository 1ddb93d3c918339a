mod auth;
mod categories;
mod courses;
mod json;
mod lectures;
mod payments;
mod students;

use axum::routing::{delete, get, post, put};
use axum::{Router, extract::State, http::StatusCode};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/categories", get(categories::list_categories).post(categories::create_category))
        .route(
            "/categories/{id}",
            put(categories::update_category).delete(categories::delete_category),
        )
        .route("/courses", get(courses::list_courses).post(courses::create_course))
        .route("/courses/mine", get(courses::my_courses))
        .route(
            "/courses/{id}",
            get(courses::course_details)
                .put(courses::update_course)
                .delete(courses::delete_course),
        )
        .route("/courses/{id}/enroll", post(courses::enroll))
        .route("/courses/{id}/enroll/sync", post(courses::top_up_progress))
        .route("/courses/{id}/students", get(courses::course_students))
        .route("/courses/{id}/rate", post(courses::rate_course))
        .route(
            "/courses/{id}/lectures",
            get(lectures::list_lectures).post(lectures::create_lecture),
        )
        .route(
            "/lectures/{id}",
            put(lectures::update_lecture).delete(lectures::delete_lecture),
        )
        .route("/lectures/{id}/completion", get(lectures::lecture_completion))
        .route(
            "/lectures/{id}/topics",
            get(lectures::list_topics).post(lectures::create_topic),
        )
        .route(
            "/lectures/{lecture_id}/topics/{topic_id}/complete",
            post(lectures::complete_topic),
        )
        .route("/topics/{id}", put(lectures::update_topic).delete(lectures::delete_topic))
        .route("/students", get(students::list_students))
        .route("/students/enrolled", get(students::list_enrolled_students))
        .route("/students/{id}/progress", get(students::student_progress))
        .route("/students/{id}", delete(students::delete_student))
        .route("/admin/reconcile", post(students::reconcile))
        .route("/payments/verify", post(payments::verify_payment))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("select 1").execute(&state.db).await {
        Ok(_) => StatusCode::OK,
        Err(err) => {
            error!("health check failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
