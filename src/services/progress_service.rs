use std::collections::{HashMap, HashSet};

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::auth::Identity;
use crate::db::{begin_write, enrollments, lectures, progress, topics, users};
use crate::error::AppError;
use crate::models::{
    LectureCompletion, OverallProgress, Role, StudentProgress, TopicCompletion, TopicWithCompletion,
};

/// `floor(100 * completed / total)`, or 0 when there is nothing to complete.
pub fn progress_percent(completed: i64, total: i64) -> u32 {
    if total <= 0 {
        return 0;
    }
    let completed = completed.clamp(0, total);
    (completed * 100 / total) as u32
}

/// Completion over every course in `course_ids`.
///
/// `topic_totals` maps course to its listed topic count and `completed` maps
/// course to the student's completed listed topics.
pub fn aggregate_progress(
    course_ids: &[String],
    topic_totals: &HashMap<String, i64>,
    completed: &HashMap<String, i64>,
) -> u32 {
    let (done, total) = course_ids.iter().fold((0, 0), |(done, total), course_id| {
        let course_total = topic_totals.get(course_id).copied().unwrap_or(0);
        let course_done = completed.get(course_id).copied().unwrap_or(0).min(course_total);
        (done + course_done, total + course_total)
    });
    progress_percent(done, total)
}

pub struct ProgressService {
    db: SqlitePool,
}

impl ProgressService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn complete_topic(
        &self,
        caller: &Identity,
        lecture_id: &str,
        topic_id: &str,
    ) -> Result<TopicCompletion, AppError> {
        let mut tx = begin_write(&self.db).await?;

        let lecture = lectures::find_lecture_by_id(&mut *tx, lecture_id)
            .await?
            .ok_or_else(|| AppError::not_found("Lecture"))?;
        topics::find_topic_by_id(&mut *tx, topic_id)
            .await?
            .ok_or_else(|| AppError::not_found("Topic"))?;
        if !topics::is_listed_in_lecture(&mut *tx, lecture_id, topic_id).await? {
            return Err(AppError::NotFound("Topic not found in this lecture".to_string()));
        }

        if enrollments::find_enrollment(&mut *tx, &caller.user_id, &lecture.course_id)
            .await?
            .is_none()
        {
            return Err(AppError::Forbidden("Not enrolled in this course".to_string()));
        }

        progress::mark_topic_completed(&mut *tx, &caller.user_id, lecture_id, topic_id, &crate::db::now()).await?;
        let row = progress::find_progress(&mut *tx, &caller.user_id, lecture_id, topic_id)
            .await?
            .ok_or(AppError::InternalServerError)?;

        let (lecture_total, lecture_done) = progress::lecture_counts(&mut *tx, &caller.user_id, lecture_id).await?;
        let (course_total, course_done) =
            progress::course_counts(&mut *tx, &caller.user_id, &lecture.course_id).await?;
        let course_completed = course_total > 0 && course_done >= course_total;
        if course_completed
            && enrollments::mark_completed(&mut *tx, &caller.user_id, &lecture.course_id).await?
        {
            info!("student {} completed course {}", caller.user_id, lecture.course_id);
        }

        tx.commit().await?;

        debug!("topic {} completed by {}", topic_id, caller.user_id);
        Ok(TopicCompletion {
            lecture_id: row.lecture_id,
            topic_id: row.topic_id,
            completed: row.completed,
            completed_at: row.completed_at,
            lecture_completed: lecture_total > 0 && lecture_done >= lecture_total,
            course_completed,
        })
    }

    /// True when the lecture lists at least one topic and the user completed all of them.
    pub async fn is_lecture_complete(&self, user_id: &str, lecture_id: &str) -> Result<LectureCompletion, AppError> {
        lectures::find_lecture_by_id(&self.db, lecture_id)
            .await?
            .ok_or_else(|| AppError::not_found("Lecture"))?;

        let (total, done) = progress::lecture_counts(&self.db, user_id, lecture_id).await?;
        Ok(LectureCompletion {
            lecture_id: lecture_id.to_string(),
            completed: total > 0 && done >= total,
        })
    }

    pub async fn topics_with_completion(
        &self,
        user_id: &str,
        lecture_id: &str,
    ) -> Result<Vec<TopicWithCompletion>, AppError> {
        lectures::find_lecture_by_id(&self.db, lecture_id)
            .await?
            .ok_or_else(|| AppError::not_found("Lecture"))?;

        let listed = topics::list_topics_for_lecture(&self.db, lecture_id).await?;
        let done: HashSet<String> = progress::completed_topic_ids(&self.db, user_id, lecture_id)
            .await?
            .into_iter()
            .collect();

        Ok(listed
            .into_iter()
            .map(|topic| {
                let completed = done.contains(&topic.id);
                TopicWithCompletion { topic, completed }
            })
            .collect())
    }

    /// Percentage of listed topics completed across all of the student's enrollments.
    pub async fn compute_course_progress(&self, student_id: &str) -> Result<u32, AppError> {
        let course_ids: Vec<String> = enrollments::list_enrollments_for_student(&self.db, student_id)
            .await?
            .into_iter()
            .map(|e| e.course_id)
            .collect();
        if course_ids.is_empty() {
            return Ok(0);
        }

        let totals: HashMap<String, i64> = progress::topic_counts_by_course(&self.db).await?.into_iter().collect();
        let completed: HashMap<String, i64> = progress::completed_counts_by_course(&self.db, Some(student_id))
            .await?
            .into_iter()
            .map(|(_, course_id, count)| (course_id, count))
            .collect();

        Ok(aggregate_progress(&course_ids, &totals, &completed))
    }

    pub async fn student_progress(&self, student_id: &str) -> Result<OverallProgress, AppError> {
        let student = users::find_user_by_id(&self.db, student_id)
            .await?
            .filter(|u| u.role == Role::Student)
            .ok_or_else(|| AppError::not_found("Student"))?;

        let progress = self.compute_course_progress(&student.id).await?;
        Ok(OverallProgress {
            student_id: student.id,
            progress,
        })
    }

    /// Progress of every student matching `search`, optionally only those with an enrollment.
    ///
    /// Runs a fixed number of queries regardless of how many students exist.
    pub async fn student_progress_report(
        &self,
        search: Option<&str>,
        enrolled_only: bool,
    ) -> Result<Vec<StudentProgress>, AppError> {
        let students = users::list_students(&self.db, search).await?;

        let mut courses_by_student: HashMap<String, Vec<String>> = HashMap::new();
        for (student_id, course_id) in enrollments::list_enrollment_pairs(&self.db).await? {
            courses_by_student.entry(student_id).or_default().push(course_id);
        }

        let totals: HashMap<String, i64> = progress::topic_counts_by_course(&self.db).await?.into_iter().collect();
        let mut completed: HashMap<String, HashMap<String, i64>> = HashMap::new();
        for (user_id, course_id, count) in progress::completed_counts_by_course(&self.db, None).await? {
            completed.entry(user_id).or_default().insert(course_id, count);
        }

        let empty = HashMap::new();
        let report = students
            .into_iter()
            .filter_map(|student| {
                let course_ids = courses_by_student.get(&student.id).map(Vec::as_slice).unwrap_or(&[]);
                if enrolled_only && course_ids.is_empty() {
                    return None;
                }
                let done = completed.get(&student.id).unwrap_or(&empty);
                Some(StudentProgress {
                    progress: aggregate_progress(course_ids, &totals, done),
                    total_courses: course_ids.len(),
                    id: student.id,
                    name: student.name,
                    email: student.email,
                })
            })
            .collect();

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{connect_in_memory, fixtures};
    use crate::models::{EnrollmentStatus, User};
    use crate::services::EnrollmentService;

    fn identity(user: &User) -> Identity {
        Identity {
            user_id: user.id.clone(),
            role: user.role,
        }
    }

    #[test]
    fn test_progress_percent_floors() {
        assert_eq!(progress_percent(0, 0), 0);
        assert_eq!(progress_percent(2, 3), 66);
        assert_eq!(progress_percent(3, 3), 100);
        assert_eq!(progress_percent(1, 7), 14);
    }

    #[test]
    fn test_aggregate_progress_spans_courses() {
        let courses = vec!["c1".to_string(), "c2".to_string(), "empty".to_string()];
        let totals = HashMap::from([("c1".to_string(), 3), ("c2".to_string(), 1)]);
        let done = HashMap::from([("c1".to_string(), 3), ("other".to_string(), 5)]);

        assert_eq!(aggregate_progress(&courses, &totals, &done), 75);
        assert_eq!(aggregate_progress(&[], &totals, &done), 0);
    }

    #[tokio::test]
    async fn test_completion_walkthrough() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        let admin = fixtures::admin(&pool).await;
        let ada = fixtures::student(&pool, "Ada").await;
        let course = fixtures::course(&pool, &admin.id, "Rust").await;
        let first = fixtures::lecture(&pool, &course.id, "Basics").await;
        let second = fixtures::lecture(&pool, &course.id, "Traits").await;
        let a = fixtures::topic(&pool, &first.id, "a").await;
        let b = fixtures::topic(&pool, &first.id, "b").await;
        let c = fixtures::topic(&pool, &second.id, "c").await;

        EnrollmentService::new(pool.clone())
            .enroll(&identity(&ada), &course.id)
            .await
            .expect("enroll");
        let service = ProgressService::new(pool.clone());
        assert_eq!(service.compute_course_progress(&ada.id).await.unwrap(), 0);

        let result = service.complete_topic(&identity(&ada), &first.id, &a.id).await.unwrap();
        assert!(result.completed);
        assert!(!result.lecture_completed);

        let result = service.complete_topic(&identity(&ada), &first.id, &b.id).await.unwrap();
        assert!(result.lecture_completed);
        assert!(!result.course_completed);
        assert_eq!(service.compute_course_progress(&ada.id).await.unwrap(), 66);

        let result = service.complete_topic(&identity(&ada), &second.id, &c.id).await.unwrap();
        assert!(result.course_completed);
        assert_eq!(service.compute_course_progress(&ada.id).await.unwrap(), 100);

        let enrollment = enrollments::find_enrollment(&pool, &ada.id, &course.id)
            .await
            .unwrap()
            .expect("Enrollment not found");
        assert_eq!(enrollment.status, EnrollmentStatus::Completed);
    }

    #[tokio::test]
    async fn test_complete_topic_guards() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        let admin = fixtures::admin(&pool).await;
        let ada = fixtures::student(&pool, "Ada").await;
        let course = fixtures::course(&pool, &admin.id, "Rust").await;
        let first = fixtures::lecture(&pool, &course.id, "Basics").await;
        let second = fixtures::lecture(&pool, &course.id, "Traits").await;
        let a = fixtures::topic(&pool, &first.id, "a").await;

        let service = ProgressService::new(pool.clone());
        let err = service.complete_topic(&identity(&ada), &first.id, &a.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        EnrollmentService::new(pool.clone())
            .enroll(&identity(&ada), &course.id)
            .await
            .expect("enroll");
        let err = service.complete_topic(&identity(&ada), &second.id, &a.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let err = service.complete_topic(&identity(&ada), &first.id, "missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_lecture_without_topics_is_not_complete() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        let admin = fixtures::admin(&pool).await;
        let ada = fixtures::student(&pool, "Ada").await;
        let course = fixtures::course(&pool, &admin.id, "Rust").await;
        let lecture = fixtures::lecture(&pool, &course.id, "Empty").await;

        let service = ProgressService::new(pool.clone());
        let completion = service.is_lecture_complete(&ada.id, &lecture.id).await.unwrap();
        assert!(!completion.completed);
        assert!(matches!(
            service.is_lecture_complete(&ada.id, "missing").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_student_progress_report() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        let admin = fixtures::admin(&pool).await;
        let ada = fixtures::student(&pool, "Ada").await;
        fixtures::student(&pool, "Bob").await;
        let course = fixtures::course(&pool, &admin.id, "Rust").await;
        let lecture = fixtures::lecture(&pool, &course.id, "Basics").await;
        let a = fixtures::topic(&pool, &lecture.id, "a").await;
        fixtures::topic(&pool, &lecture.id, "b").await;

        EnrollmentService::new(pool.clone())
            .enroll(&identity(&ada), &course.id)
            .await
            .expect("enroll");
        let service = ProgressService::new(pool.clone());
        service.complete_topic(&identity(&ada), &lecture.id, &a.id).await.unwrap();

        let all = service.student_progress_report(None, false).await.unwrap();
        assert_eq!(all.len(), 2);
        let ada_row = all.iter().find(|s| s.id == ada.id).expect("Ada in report");
        assert_eq!(ada_row.total_courses, 1);
        assert_eq!(ada_row.progress, 50);

        let enrolled = service.student_progress_report(None, true).await.unwrap();
        assert_eq!(enrolled.len(), 1);
        assert!(service.student_progress_report(Some("bob"), true).await.unwrap().is_empty());
    }
}
