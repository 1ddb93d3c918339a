use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::auth::Identity;
use crate::db::{begin_write, courses, enrollments, progress};
use crate::error::AppError;
use crate::models::{Enrollment, ProgressTopUp, Role};

pub struct EnrollmentService {
    db: SqlitePool,
}

impl EnrollmentService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Enrolls the caller in the course and seeds an incomplete progress row
    /// for every topic the course currently lists.
    pub async fn enroll(&self, caller: &Identity, course_id: &str) -> Result<Enrollment, AppError> {
        if caller.role != Role::Student {
            warn!(user_id = %caller.user_id, "non-student tried to enroll");
            return Err(AppError::Forbidden("Only students can enroll in courses".to_string()));
        }

        let mut tx = begin_write(&self.db).await?;

        courses::find_course_by_id(&mut *tx, course_id)
            .await?
            .ok_or_else(|| AppError::not_found("Course"))?;

        if enrollments::find_enrollment(&mut *tx, &caller.user_id, course_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Already enrolled in this course".to_string()));
        }

        let enrollment = enrollments::insert_enrollment(&mut *tx, &caller.user_id, course_id).await?;
        courses::add_enrolled_student(&mut *tx, course_id, &caller.user_id).await?;
        let seeded = progress::seed_for_enrollment(&mut *tx, &caller.user_id, course_id).await?;

        tx.commit().await?;

        info!(
            "student {} enrolled in course {} ({} progress rows)",
            caller.user_id, course_id, seeded
        );
        Ok(enrollment)
    }

    /// Creates progress rows for topics added to the course after enrollment.
    pub async fn top_up_progress(&self, caller: &Identity, course_id: &str) -> Result<ProgressTopUp, AppError> {
        let mut tx = begin_write(&self.db).await?;

        enrollments::find_enrollment(&mut *tx, &caller.user_id, course_id)
            .await?
            .ok_or_else(|| AppError::not_found("Enrollment"))?;

        courses::add_enrolled_student(&mut *tx, course_id, &caller.user_id).await?;
        let created = progress::seed_for_enrollment(&mut *tx, &caller.user_id, course_id).await?;

        tx.commit().await?;

        if created > 0 {
            info!("topped up {} progress rows for {} in {}", created, caller.user_id, course_id);
        }
        Ok(ProgressTopUp {
            course_id: course_id.to_string(),
            created,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::db::{connect, connect_in_memory, fixtures, migrate};
    use crate::models::EnrollmentStatus;

    fn identity(user: &crate::models::User) -> Identity {
        Identity {
            user_id: user.id.clone(),
            role: user.role,
        }
    }

    #[tokio::test]
    async fn test_enroll_seeds_progress_rows() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        let admin = fixtures::admin(&pool).await;
        let ada = fixtures::student(&pool, "Ada").await;
        let course = fixtures::course(&pool, &admin.id, "Rust").await;
        let first = fixtures::lecture(&pool, &course.id, "Basics").await;
        let second = fixtures::lecture(&pool, &course.id, "Traits").await;
        fixtures::topic(&pool, &first.id, "a").await;
        fixtures::topic(&pool, &first.id, "b").await;
        fixtures::topic(&pool, &second.id, "c").await;

        let service = EnrollmentService::new(pool.clone());
        let enrollment = service.enroll(&identity(&ada), &course.id).await.expect("enroll");

        assert_eq!(enrollment.status, EnrollmentStatus::Enrolled);
        assert!(courses::is_enrolled_student(&pool, &course.id, &ada.id).await.unwrap());
        let rows = progress::list_progress_for_user(&pool, &ada.id).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|p| !p.completed));
    }

    #[tokio::test]
    async fn test_enroll_twice_conflicts() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        let admin = fixtures::admin(&pool).await;
        let ada = fixtures::student(&pool, "Ada").await;
        let course = fixtures::course(&pool, &admin.id, "Rust").await;

        let service = EnrollmentService::new(pool.clone());
        service.enroll(&identity(&ada), &course.id).await.expect("enroll");
        let err = service.enroll(&identity(&ada), &course.id).await.unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(enrollments::list_enrollment_pairs(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_enroll_rejects_admin_and_missing_course() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        let admin = fixtures::admin(&pool).await;
        let ada = fixtures::student(&pool, "Ada").await;
        let course = fixtures::course(&pool, &admin.id, "Rust").await;

        let service = EnrollmentService::new(pool.clone());
        let err = service.enroll(&identity(&admin), &course.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = service.enroll(&identity(&ada), "missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(enrollments::list_enrollment_pairs(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_top_up_adds_rows_for_new_topics() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        let admin = fixtures::admin(&pool).await;
        let ada = fixtures::student(&pool, "Ada").await;
        let course = fixtures::course(&pool, &admin.id, "Rust").await;
        let lecture = fixtures::lecture(&pool, &course.id, "Basics").await;
        fixtures::topic(&pool, &lecture.id, "a").await;

        let service = EnrollmentService::new(pool.clone());
        service.enroll(&identity(&ada), &course.id).await.expect("enroll");
        fixtures::topic(&pool, &lecture.id, "late").await;

        let top_up = service.top_up_progress(&identity(&ada), &course.id).await.expect("top up");
        assert_eq!(top_up.created, 1);
        let again = service.top_up_progress(&identity(&ada), &course.id).await.expect("top up");
        assert_eq!(again.created, 0);

        let err = service
            .top_up_progress(&identity(&admin), &course.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_enrollments_on_file_database() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let url = format!("sqlite://{}", dir.path().join("lms.db").display());
        let pool = connect(&url, 8).await.expect("Failed to open db");
        migrate(&pool).await.expect("Failed to migrate");

        let admin = fixtures::admin(&pool).await;
        let course = fixtures::course(&pool, &admin.id, "Rust").await;
        let lecture = fixtures::lecture(&pool, &course.id, "Basics").await;
        for n in 0..20 {
            fixtures::topic(&pool, &lecture.id, &format!("topic-{n}")).await;
        }
        let mut students = Vec::new();
        for n in 0..40 {
            students.push(fixtures::student(&pool, &format!("Student {n}")).await);
        }

        let service = Arc::new(EnrollmentService::new(pool.clone()));
        let handles: Vec<_> = students
            .iter()
            .map(|student| {
                let service = Arc::clone(&service);
                let caller = identity(student);
                let course_id = course.id.clone();
                tokio::spawn(async move { service.enroll(&caller, &course_id).await })
            })
            .collect();
        for handle in handles {
            handle.await.expect("enroll task panicked").expect("enroll");
        }

        assert_eq!(enrollments::count_enrollments_for_course(&pool, &course.id).await.unwrap(), 40);
        let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_progress")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 40 * 20);

        // the same student racing itself gets one enrollment and one Conflict
        let late = fixtures::student(&pool, "Late").await;
        let racing: Vec<_> = (0..2)
            .map(|_| {
                let service = Arc::clone(&service);
                let caller = identity(&late);
                let course_id = course.id.clone();
                tokio::spawn(async move { service.enroll(&caller, &course_id).await })
            })
            .collect();
        let mut outcomes = Vec::new();
        for handle in racing {
            outcomes.push(handle.await.expect("enroll task panicked"));
        }
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes.iter().any(|r| matches!(r, Err(AppError::Conflict(_)))));

        pool.close().await;
    }
}
