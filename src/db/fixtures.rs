//! Seed data shared by repository and service tests.

use sqlx::SqlitePool;

use crate::db::{categories, courses, lectures, new_id, now, topics, users};
use crate::models::{Course, CourseLevel, Lecture, PricingModel, ResourceType, Role, Topic, User, ValidTopic};

pub async fn user(pool: &SqlitePool, name: &str, role: Role) -> User {
    let email = format!("{}@example.com", name.to_lowercase().replace(' ', "."));
    users::insert_user(
        pool,
        users::NewUser {
            name,
            email: &email,
            phone_number: None,
            password_hash: "hash",
            role,
        },
    )
    .await
    .expect("Failed to insert user")
}

pub async fn admin(pool: &SqlitePool) -> User {
    user(pool, "Admin", Role::Admin).await
}

pub async fn student(pool: &SqlitePool, name: &str) -> User {
    user(pool, name, Role::Student).await
}

pub async fn course(pool: &SqlitePool, instructor_id: &str, title: &str) -> Course {
    let category = categories::insert_category(pool, &format!("{title} category"))
        .await
        .expect("Failed to insert category");
    let course = Course {
        id: new_id(),
        title: title.to_string(),
        short_description: None,
        description: None,
        category_id: category.id,
        level: CourseLevel::Beginner,
        language: Some("en".to_string()),
        featured: false,
        price: 0.0,
        discount_price: None,
        discount_enabled: false,
        course_image: None,
        video_url: None,
        instructor_id: instructor_id.to_string(),
        pricing_model: PricingModel::Free,
        average_rating: 0.0,
        created_at: now(),
        updated_at: now(),
    };
    courses::insert_course(pool, &course)
        .await
        .expect("Failed to insert course");
    course
}

pub async fn lecture(pool: &SqlitePool, course_id: &str, title: &str) -> Lecture {
    lectures::insert_lecture(pool, course_id, title)
        .await
        .expect("Failed to insert lecture")
}

/// Inserts a video topic and appends it to the lecture's list.
pub async fn topic(pool: &SqlitePool, lecture_id: &str, name: &str) -> Topic {
    let valid = ValidTopic {
        name: name.to_string(),
        description: String::new(),
        resource_type: ResourceType::Video,
        resource_link: format!("https://cdn.example.com/{name}.mp4"),
    };
    let topic = topics::insert_topic(pool, lecture_id, &valid)
        .await
        .expect("Failed to insert topic");
    topics::append_to_lecture(pool, lecture_id, &topic.id)
        .await
        .expect("Failed to list topic");
    topic
}
