#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use lms_backend::auth::JwtAuthority;
use lms_backend::config::AdminSeed;
use lms_backend::error::AppError;
use lms_backend::models::PaymentVerification;
use lms_backend::payments::PaymentGateway;
use lms_backend::services::AuthService;
use lms_backend::{AppState, db, router};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin-password";

/// Accepts only the reference `paid_ref`.
pub struct FakeGateway;

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn verify_transaction(&self, reference: &str) -> Result<PaymentVerification, AppError> {
        let success = reference == "paid_ref";
        Ok(PaymentVerification {
            success,
            message: if success { "Payment verified successfully" } else { "Payment verification failed" }
                .to_string(),
            data: success.then(|| json!({ "reference": reference, "status": "success" })),
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
}

impl TestApp {
    pub async fn new() -> Self {
        let pool = db::connect_in_memory().await.expect("Failed to create test db");
        let auth = Arc::new(JwtAuthority::new("integration-secret".to_string(), 1));

        AuthService::new(pool.clone(), auth.clone())
            .ensure_admin(&AdminSeed {
                name: "Admin".to_string(),
                email: ADMIN_EMAIL.to_string(),
                password: ADMIN_PASSWORD.to_string(),
            })
            .await
            .expect("Failed to seed admin");

        let state = AppState {
            db: pool.clone(),
            auth,
            payments: Arc::new(FakeGateway),
        };

        Self {
            router: router(state),
            pool,
        }
    }

    pub async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        self.dispatch(request).await
    }

    /// Posts `body` verbatim with the given content type.
    pub async fn post_raw(&self, uri: &str, token: Option<&str>, content_type: &str, body: &str) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = builder
            .body(Body::from(body.to_string()))
            .expect("Failed to build request");

        self.dispatch(request).await
    }

    async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.expect("Request failed");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Response is not JSON")
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, token, None).await
    }

    pub async fn admin_token(&self) -> String {
        let (status, body) = self
            .post(
                "/auth/login",
                None,
                json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "admin login failed: {body}");
        token_of(&body)
    }

    /// Registers a student and returns `(user_id, token)`.
    pub async fn register_student(&self, name: &str) -> (String, String) {
        let email = format!("{}@example.com", name.to_lowercase());
        let (status, body) = self
            .post(
                "/auth/register",
                None,
                json!({ "name": name, "email": email, "password": "student-pw" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "registration failed: {body}");
        (id_of(&body["user"]), token_of(&body))
    }

    /// A course with lectures holding the given number of topics each.
    /// Returns `(course_id, [(lecture_id, [topic_id])])`.
    pub async fn course_with_topics(&self, admin: &str, layout: &[usize]) -> (String, Vec<(String, Vec<String>)>) {
        let (status, category) = self.post("/categories", Some(admin), json!({ "name": "Programming" })).await;
        assert_eq!(status, StatusCode::CREATED, "category failed: {category}");

        let (status, course) = self
            .post(
                "/courses",
                Some(admin),
                json!({ "title": "Rust", "category_id": id_of(&category), "price": 0 }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "course failed: {course}");
        let course_id = id_of(&course);

        let mut lectures = Vec::new();
        for (i, topic_count) in layout.iter().enumerate() {
            let (status, lecture) = self
                .post(
                    &format!("/courses/{course_id}/lectures"),
                    Some(admin),
                    json!({ "title": format!("Lecture {i}") }),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "lecture failed: {lecture}");
            let lecture_id = id_of(&lecture);

            let mut topics = Vec::new();
            for t in 0..*topic_count {
                topics.push(self.add_topic(admin, &lecture_id, &format!("Topic {i}.{t}")).await);
            }
            lectures.push((lecture_id, topics));
        }
        (course_id, lectures)
    }

    pub async fn add_topic(&self, admin: &str, lecture_id: &str, name: &str) -> String {
        let (status, topic) = self
            .post(
                &format!("/lectures/{lecture_id}/topics"),
                Some(admin),
                json!({
                    "name": name,
                    "resource_type": "video",
                    "resource_link": "https://cdn.example.com/v.mp4"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "topic failed: {topic}");
        id_of(&topic)
    }
}

pub fn id_of(value: &Value) -> String {
    value["id"].as_str().expect("missing id").to_string()
}

pub fn token_of(value: &Value) -> String {
    value["token"].as_str().expect("missing token").to_string()
}
