use sqlx::{SqliteConnection, SqliteExecutor};

use crate::db::{new_id, now};
use crate::models::{Enrollment, EnrollmentStatus};

const ENROLLMENT_COLUMNS: &str = "id, student_id, course_id, status, enrolled_at, completed_at";

pub async fn insert_enrollment<'e, E>(db: E, student_id: &str, course_id: &str) -> Result<Enrollment, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let enrollment = Enrollment {
        id: new_id(),
        student_id: student_id.to_string(),
        course_id: course_id.to_string(),
        status: EnrollmentStatus::Enrolled,
        enrolled_at: now(),
        completed_at: None,
    };

    sqlx::query(
        r#"
        INSERT INTO enrollments (id, student_id, course_id, status, enrolled_at, completed_at)
        VALUES (?1, ?2, ?3, ?4, ?5, NULL)
        "#,
    )
    .bind(&enrollment.id)
    .bind(&enrollment.student_id)
    .bind(&enrollment.course_id)
    .bind(enrollment.status)
    .bind(&enrollment.enrolled_at)
    .execute(db)
    .await?;

    Ok(enrollment)
}

pub async fn find_enrollment<'e, E>(db: E, student_id: &str, course_id: &str) -> Result<Option<Enrollment>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE student_id = ?1 AND course_id = ?2"
    ))
    .bind(student_id)
    .bind(course_id)
    .fetch_optional(db)
    .await
}

pub async fn list_enrollments_for_student<'e, E>(db: E, student_id: &str) -> Result<Vec<Enrollment>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE student_id = ? ORDER BY enrolled_at, id"
    ))
    .bind(student_id)
    .fetch_all(db)
    .await
}

pub async fn count_enrollments_for_course<'e, E>(db: E, course_id: &str) -> Result<i64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM enrollments WHERE course_id = ?")
        .bind(course_id)
        .fetch_one(db)
        .await?;
    Ok(count)
}

/// Every (student_id, course_id) pair.
pub async fn list_enrollment_pairs<'e, E>(db: E) -> Result<Vec<(String, String)>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as("SELECT student_id, course_id FROM enrollments")
        .fetch_all(db)
        .await
}

/// Moves the enrollment to `Completed`; a no-op if it already is.
pub async fn mark_completed<'e, E>(db: E, student_id: &str, course_id: &str) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE enrollments
        SET status = 'Completed',
            completed_at = ?3
        WHERE student_id = ?1 AND course_id = ?2 AND status != 'Completed'
        "#,
    )
    .bind(student_id)
    .bind(course_id)
    .bind(now())
    .execute(db)
    .await?
    .rows_affected();
    Ok(result > 0)
}

// True when the enrollment's course lists a topic the student has not completed.
const HAS_OPEN_TOPIC: &str = r#"
    EXISTS (
        SELECT 1
        FROM lectures l
        JOIN lecture_topics lt ON lt.lecture_id = l.id
        LEFT JOIN user_progress p
            ON p.lecture_id = lt.lecture_id AND p.topic_id = lt.topic_id AND p.user_id = enrollments.student_id
        WHERE l.course_id = enrollments.course_id AND COALESCE(p.completed, 0) = 0
    )"#;

const HAS_LISTED_TOPIC: &str = r#"
    EXISTS (
        SELECT 1
        FROM lectures l
        JOIN lecture_topics lt ON lt.lecture_id = l.id
        WHERE l.course_id = enrollments.course_id
    )"#;

/// Re-derives `status` from progress after the course's topic list changed.
///
/// Enrollments whose listed topics are all completed become `Completed`, and
/// `Completed` ones with an open topic (or no topics at all) go back to
/// `Enrolled`. `course_id` narrows to one course. Returns
/// `(completed, reopened)`.
pub async fn sync_completion(
    conn: &mut SqliteConnection,
    course_id: Option<&str>,
) -> Result<(u64, u64), sqlx::Error> {
    let completed = sqlx::query(&format!(
        r#"
        UPDATE enrollments
        SET status = 'Completed',
            completed_at = ?2
        WHERE status != 'Completed'
          AND (?1 IS NULL OR course_id = ?1)
          AND {HAS_LISTED_TOPIC}
          AND NOT {HAS_OPEN_TOPIC}
        "#
    ))
    .bind(course_id)
    .bind(now())
    .execute(&mut *conn)
    .await?
    .rows_affected();

    let reopened = sqlx::query(&format!(
        r#"
        UPDATE enrollments
        SET status = 'Enrolled',
            completed_at = NULL
        WHERE status = 'Completed'
          AND (?1 IS NULL OR course_id = ?1)
          AND (NOT {HAS_LISTED_TOPIC} OR {HAS_OPEN_TOPIC})
        "#
    ))
    .bind(course_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    Ok((completed, reopened))
}

pub async fn delete_enrollments_for_student<'e, E>(db: E, student_id: &str) -> Result<u64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM enrollments WHERE student_id = ?")
        .bind(student_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}
