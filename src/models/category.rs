use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub id: String,
    pub name: String,
    pub course_count: usize,
    pub course_names: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRequest {
    #[serde(default)]
    pub name: String,
}
