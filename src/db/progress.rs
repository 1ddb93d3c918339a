use sqlx::SqliteExecutor;

use crate::models::UserProgress;

/// Creates an incomplete progress row for every listed topic of the course
/// that the student does not have one for yet. Returns the number created.
pub async fn seed_for_enrollment<'e, E>(db: E, student_id: &str, course_id: &str) -> Result<u64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO user_progress (user_id, lecture_id, topic_id, completed, completed_at)
        SELECT ?1, lt.lecture_id, lt.topic_id, 0, NULL
        FROM lectures l
        JOIN lecture_topics lt ON lt.lecture_id = l.id
        WHERE l.course_id = ?2
        ON CONFLICT(user_id, lecture_id, topic_id) DO NOTHING
        "#,
    )
    .bind(student_id)
    .bind(course_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

/// Same as [`seed_for_enrollment`] across every enrollment.
pub async fn seed_missing_for_all_enrollments<'e, E>(db: E) -> Result<u64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO user_progress (user_id, lecture_id, topic_id, completed, completed_at)
        SELECT e.student_id, lt.lecture_id, lt.topic_id, 0, NULL
        FROM enrollments e
        JOIN lectures l ON l.course_id = e.course_id
        JOIN lecture_topics lt ON lt.lecture_id = l.id
        WHERE 1
        ON CONFLICT(user_id, lecture_id, topic_id) DO NOTHING
        "#,
    )
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

/// Marks the topic completed. `completed_at` keeps its first value.
pub async fn mark_topic_completed<'e, E>(
    db: E,
    user_id: &str,
    lecture_id: &str,
    topic_id: &str,
    now: &str,
) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO user_progress (user_id, lecture_id, topic_id, completed, completed_at)
        VALUES (?1, ?2, ?3, 1, ?4)
        ON CONFLICT(user_id, lecture_id, topic_id) DO UPDATE SET
            completed = 1,
            completed_at = COALESCE(user_progress.completed_at, excluded.completed_at)
        "#,
    )
    .bind(user_id)
    .bind(lecture_id)
    .bind(topic_id)
    .bind(now)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn find_progress<'e, E>(
    db: E,
    user_id: &str,
    lecture_id: &str,
    topic_id: &str,
) -> Result<Option<UserProgress>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, UserProgress>(
        r#"
        SELECT user_id, lecture_id, topic_id, completed, completed_at
        FROM user_progress
        WHERE user_id = ?1 AND lecture_id = ?2 AND topic_id = ?3
        "#,
    )
    .bind(user_id)
    .bind(lecture_id)
    .bind(topic_id)
    .fetch_optional(db)
    .await
}

pub async fn list_progress_for_user<'e, E>(db: E, user_id: &str) -> Result<Vec<UserProgress>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, UserProgress>(
        r#"
        SELECT user_id, lecture_id, topic_id, completed, completed_at
        FROM user_progress
        WHERE user_id = ?
        ORDER BY lecture_id, topic_id
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn completed_topic_ids<'e, E>(db: E, user_id: &str, lecture_id: &str) -> Result<Vec<String>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT topic_id FROM user_progress WHERE user_id = ?1 AND lecture_id = ?2 AND completed = 1",
    )
    .bind(user_id)
    .bind(lecture_id)
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// `(listed topics, completed listed topics)` of one lecture for the user.
pub async fn lecture_counts<'e, E>(db: E, user_id: &str, lecture_id: &str) -> Result<(i64, i64), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as(
        r#"
        SELECT COUNT(*),
               COALESCE(SUM(CASE WHEN p.completed = 1 THEN 1 ELSE 0 END), 0)
        FROM lecture_topics lt
        LEFT JOIN user_progress p
            ON p.lecture_id = lt.lecture_id AND p.topic_id = lt.topic_id AND p.user_id = ?1
        WHERE lt.lecture_id = ?2
        "#,
    )
    .bind(user_id)
    .bind(lecture_id)
    .fetch_one(db)
    .await
}

/// `(listed topics, completed listed topics)` of a whole course for the user.
pub async fn course_counts<'e, E>(db: E, user_id: &str, course_id: &str) -> Result<(i64, i64), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as(
        r#"
        SELECT COUNT(*),
               COALESCE(SUM(CASE WHEN p.completed = 1 THEN 1 ELSE 0 END), 0)
        FROM lectures l
        JOIN lecture_topics lt ON lt.lecture_id = l.id
        LEFT JOIN user_progress p
            ON p.lecture_id = lt.lecture_id AND p.topic_id = lt.topic_id AND p.user_id = ?1
        WHERE l.course_id = ?2
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_one(db)
    .await
}

/// Listed topic count per course, for courses that have any.
pub async fn topic_counts_by_course<'e, E>(db: E) -> Result<Vec<(String, i64)>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as(
        r#"
        SELECT l.course_id, COUNT(lt.topic_id)
        FROM lectures l
        JOIN lecture_topics lt ON lt.lecture_id = l.id
        GROUP BY l.course_id
        "#,
    )
    .fetch_all(db)
    .await
}

/// Completed listed topics per (user, course). `user_id` narrows to one user.
pub async fn completed_counts_by_course<'e, E>(
    db: E,
    user_id: Option<&str>,
) -> Result<Vec<(String, String, i64)>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as(
        r#"
        SELECT p.user_id, l.course_id, COUNT(*)
        FROM user_progress p
        JOIN lecture_topics lt ON lt.lecture_id = p.lecture_id AND lt.topic_id = p.topic_id
        JOIN lectures l ON l.id = p.lecture_id
        WHERE p.completed = 1 AND (?1 IS NULL OR p.user_id = ?1)
        GROUP BY p.user_id, l.course_id
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn delete_progress_for_topic<'e, E>(db: E, topic_id: &str) -> Result<u64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM user_progress WHERE topic_id = ?")
        .bind(topic_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_progress_for_user<'e, E>(db: E, user_id: &str) -> Result<u64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM user_progress WHERE user_id = ?")
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

/// Deletes rows whose topic left its lecture's list or whose user is not
/// enrolled in the lecture's course.
pub async fn delete_orphaned_progress<'e, E>(db: E) -> Result<u64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        DELETE FROM user_progress
        WHERE NOT EXISTS (
                SELECT 1 FROM lecture_topics lt
                WHERE lt.lecture_id = user_progress.lecture_id
                  AND lt.topic_id = user_progress.topic_id
            )
           OR NOT EXISTS (
                SELECT 1 FROM lectures l
                JOIN enrollments e ON e.course_id = l.course_id
                WHERE l.id = user_progress.lecture_id
                  AND e.student_id = user_progress.user_id
            )
        "#,
    )
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}
