use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::auth::Identity;
use crate::db::{begin_write, courses, enrollments, progress, users};
use crate::error::AppError;
use crate::models::Role;

#[derive(Debug, Serialize)]
pub struct StudentRemoval {
    pub student_id: String,
    pub enrollments_removed: u64,
    pub progress_removed: u64,
}

pub struct StudentService {
    db: SqlitePool,
}

impl StudentService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Deletes a student and everything they own in one transaction.
    pub async fn delete_student(&self, caller: &Identity, student_id: &str) -> Result<StudentRemoval, AppError> {
        caller.require_role(Role::Admin)?;

        let mut tx = begin_write(&self.db).await?;

        let user = users::find_user_by_id(&mut *tx, student_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;
        if user.role != Role::Student {
            return Err(AppError::Validation("User is not a student".to_string()));
        }

        let progress_removed = progress::delete_progress_for_user(&mut *tx, student_id).await?;
        let enrollments_removed = enrollments::delete_enrollments_for_student(&mut *tx, student_id).await?;
        courses::remove_student_from_all_courses(&mut *tx, student_id).await?;
        courses::delete_ratings_by_user(&mut *tx, student_id).await?;
        users::delete_user(&mut *tx, student_id).await?;

        tx.commit().await?;

        info!(
            "student {} deleted ({} enrollments, {} progress rows)",
            student_id, enrollments_removed, progress_removed
        );
        Ok(StudentRemoval {
            student_id: student_id.to_string(),
            enrollments_removed,
            progress_removed,
        })
    }
}
