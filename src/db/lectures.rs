use sqlx::SqliteExecutor;

use crate::db::{new_id, now};
use crate::models::Lecture;

pub async fn insert_lecture<'e, E>(db: E, course_id: &str, title: &str) -> Result<Lecture, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let lecture = Lecture {
        id: new_id(),
        course_id: course_id.to_string(),
        title: title.to_string(),
        created_at: now(),
    };

    sqlx::query("INSERT INTO lectures (id, course_id, title, created_at) VALUES (?1, ?2, ?3, ?4)")
        .bind(&lecture.id)
        .bind(&lecture.course_id)
        .bind(&lecture.title)
        .bind(&lecture.created_at)
        .execute(db)
        .await?;

    Ok(lecture)
}

pub async fn find_lecture_by_id<'e, E>(db: E, id: &str) -> Result<Option<Lecture>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Lecture>("SELECT id, course_id, title, created_at FROM lectures WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn list_lectures_by_course<'e, E>(db: E, course_id: &str) -> Result<Vec<Lecture>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Lecture>(
        "SELECT id, course_id, title, created_at FROM lectures WHERE course_id = ? ORDER BY created_at, id",
    )
    .bind(course_id)
    .fetch_all(db)
    .await
}

pub async fn rename_lecture<'e, E>(db: E, id: &str, title: &str) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("UPDATE lectures SET title = ?1 WHERE id = ?2")
        .bind(title)
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();
    Ok(result > 0)
}

/// Number of Topic records owned by the lecture.
pub async fn count_topics<'e, E>(db: E, lecture_id: &str) -> Result<i64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM topics WHERE lecture_id = ?")
        .bind(lecture_id)
        .fetch_one(db)
        .await?;
    Ok(count)
}

pub async fn delete_lecture<'e, E>(db: E, id: &str) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM lectures WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();
    Ok(result > 0)
}
