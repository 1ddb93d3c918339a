use std::collections::HashMap;

use sqlx::SqlitePool;
use tracing::info;

use crate::auth::Identity;
use crate::db::{begin_write, courses, enrollments, lectures, progress, topics};
use crate::error::AppError;
use crate::models::{Lecture, LectureRequest, LectureWithTopics, Role, Topic, TopicRequest, required};

/// Lectures of a course and the topics they list.
pub struct CurriculumService {
    db: SqlitePool,
}

impl CurriculumService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn lectures(&self, course_id: &str) -> Result<Vec<LectureWithTopics>, AppError> {
        courses::find_course_by_id(&self.db, course_id)
            .await?
            .ok_or_else(|| AppError::not_found("Course"))?;

        let lectures = lectures::list_lectures_by_course(&self.db, course_id).await?;
        let mut by_lecture: HashMap<String, Vec<Topic>> = HashMap::new();
        for topic in topics::list_topics_for_course(&self.db, course_id).await? {
            by_lecture.entry(topic.lecture_id.clone()).or_default().push(topic);
        }

        Ok(lectures
            .into_iter()
            .map(|lecture| LectureWithTopics {
                topics: by_lecture.remove(&lecture.id).unwrap_or_default(),
                lecture,
            })
            .collect())
    }

    pub async fn create_lecture(
        &self,
        caller: &Identity,
        course_id: &str,
        req: LectureRequest,
    ) -> Result<Lecture, AppError> {
        caller.require_role(Role::Admin)?;
        let title = required(&req.title, "Lecture title")?;

        courses::find_course_by_id(&self.db, course_id)
            .await?
            .ok_or_else(|| AppError::not_found("Course"))?;

        let lecture = lectures::insert_lecture(&self.db, course_id, &title).await?;
        info!("lecture {} added to course {}", lecture.id, course_id);
        Ok(lecture)
    }

    pub async fn update_lecture(
        &self,
        caller: &Identity,
        lecture_id: &str,
        req: LectureRequest,
    ) -> Result<Lecture, AppError> {
        caller.require_role(Role::Admin)?;
        let title = required(&req.title, "Lecture title")?;

        if !lectures::rename_lecture(&self.db, lecture_id, &title).await? {
            return Err(AppError::not_found("Lecture"));
        }
        lectures::find_lecture_by_id(&self.db, lecture_id)
            .await?
            .ok_or_else(|| AppError::not_found("Lecture"))
    }

    /// Refuses while any topic still belongs to the lecture.
    pub async fn delete_lecture(&self, caller: &Identity, lecture_id: &str) -> Result<(), AppError> {
        caller.require_role(Role::Admin)?;

        let mut tx = begin_write(&self.db).await?;
        lectures::find_lecture_by_id(&mut *tx, lecture_id)
            .await?
            .ok_or_else(|| AppError::not_found("Lecture"))?;

        let remaining = lectures::count_topics(&mut *tx, lecture_id).await?;
        if remaining > 0 {
            return Err(AppError::Conflict(format!(
                "Cannot delete lecture with {} existing topic(s)",
                remaining
            )));
        }

        lectures::delete_lecture(&mut *tx, lecture_id).await?;
        tx.commit().await?;

        info!("lecture {} deleted", lecture_id);
        Ok(())
    }

    /// Creates the topic and appends it to the lecture's list.
    pub async fn create_topic(
        &self,
        caller: &Identity,
        lecture_id: &str,
        req: TopicRequest,
    ) -> Result<Topic, AppError> {
        caller.require_role(Role::Admin)?;
        let valid = req.validate()?;

        let mut tx = begin_write(&self.db).await?;
        let lecture = lectures::find_lecture_by_id(&mut *tx, lecture_id)
            .await?
            .ok_or_else(|| AppError::not_found("Lecture"))?;

        let topic = topics::insert_topic(&mut *tx, lecture_id, &valid).await?;
        topics::append_to_lecture(&mut *tx, lecture_id, &topic.id).await?;
        let (_, reopened) = enrollments::sync_completion(&mut *tx, Some(&lecture.course_id)).await?;
        tx.commit().await?;

        info!(
            "topic {} added to lecture {} ({} completed enrollments reopened)",
            topic.id, lecture_id, reopened
        );
        Ok(topic)
    }

    pub async fn update_topic(&self, caller: &Identity, topic_id: &str, req: TopicRequest) -> Result<Topic, AppError> {
        caller.require_role(Role::Admin)?;
        let valid = req.validate()?;

        if !topics::update_topic(&self.db, topic_id, &valid).await? {
            return Err(AppError::not_found("Topic"));
        }
        topics::find_topic_by_id(&self.db, topic_id)
            .await?
            .ok_or_else(|| AppError::not_found("Topic"))
    }

    /// Unlists the topic, drops every progress row keyed to it, then deletes it.
    pub async fn delete_topic(&self, caller: &Identity, topic_id: &str) -> Result<(), AppError> {
        caller.require_role(Role::Admin)?;

        let mut tx = begin_write(&self.db).await?;
        let topic = topics::find_topic_by_id(&mut *tx, topic_id)
            .await?
            .ok_or_else(|| AppError::not_found("Topic"))?;
        let lecture = lectures::find_lecture_by_id(&mut *tx, &topic.lecture_id).await?;

        topics::remove_from_lecture(&mut *tx, topic_id).await?;
        let dropped = progress::delete_progress_for_topic(&mut *tx, topic_id).await?;
        topics::delete_topic(&mut *tx, topic_id).await?;
        let (completed, _) = match lecture {
            Some(lecture) => enrollments::sync_completion(&mut *tx, Some(&lecture.course_id)).await?,
            None => (0, 0),
        };
        tx.commit().await?;

        info!(
            "topic {} deleted ({} progress rows removed, {} enrollments completed)",
            topic_id, dropped, completed
        );
        Ok(())
    }
}
