use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Completion record for one (user, lecture, topic) triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserProgress {
    pub user_id: String,
    pub lecture_id: String,
    pub topic_id: String,
    pub completed: bool,
    pub completed_at: Option<String>,
}

/// Result of completing a topic: the topic's state plus the derived lecture state.
#[derive(Debug, Clone, Serialize)]
pub struct TopicCompletion {
    pub lecture_id: String,
    pub topic_id: String,
    pub completed: bool,
    pub completed_at: Option<String>,
    pub lecture_completed: bool,
    pub course_completed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LectureCompletion {
    pub lecture_id: String,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentProgress {
    pub id: String,
    pub name: String,
    pub email: String,
    pub total_courses: usize,
    pub progress: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverallProgress {
    pub student_id: String,
    pub progress: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentSearch {
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressTopUp {
    pub course_id: String,
    pub created: u64,
}
