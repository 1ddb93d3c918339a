use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::Topic;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Lecture {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct LectureWithTopics {
    #[serde(flatten)]
    pub lecture: Lecture,
    pub topics: Vec<Topic>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LectureRequest {
    #[serde(default)]
    pub title: String,
}
