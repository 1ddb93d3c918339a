use sqlx::SqliteExecutor;

use crate::db::{new_id, now};
use crate::models::{Topic, ValidTopic};

const TOPIC_COLUMNS: &str =
    "t.id, t.lecture_id, t.name, t.description, t.resource_type, t.resource_link, t.created_at";

pub async fn insert_topic<'e, E>(db: E, lecture_id: &str, topic: &ValidTopic) -> Result<Topic, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let topic = Topic {
        id: new_id(),
        lecture_id: lecture_id.to_string(),
        name: topic.name.clone(),
        description: topic.description.clone(),
        resource_type: topic.resource_type,
        resource_link: topic.resource_link.clone(),
        created_at: now(),
    };

    sqlx::query(
        r#"
        INSERT INTO topics (id, lecture_id, name, description, resource_type, resource_link, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&topic.id)
    .bind(&topic.lecture_id)
    .bind(&topic.name)
    .bind(&topic.description)
    .bind(topic.resource_type)
    .bind(&topic.resource_link)
    .bind(&topic.created_at)
    .execute(db)
    .await?;

    Ok(topic)
}

/// Appends the topic to the end of the lecture's ordered topic list.
pub async fn append_to_lecture<'e, E>(db: E, lecture_id: &str, topic_id: &str) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO lecture_topics (lecture_id, topic_id, position)
        SELECT ?1, ?2, COALESCE(MAX(position) + 1, 0)
        FROM lecture_topics WHERE lecture_id = ?1
        "#,
    )
    .bind(lecture_id)
    .bind(topic_id)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn remove_from_lecture<'e, E>(db: E, topic_id: &str) -> Result<u64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM lecture_topics WHERE topic_id = ?")
        .bind(topic_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

/// Whether `topic_id` appears in the lecture's topic list.
pub async fn is_listed_in_lecture<'e, E>(db: E, lecture_id: &str, topic_id: &str) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM lecture_topics WHERE lecture_id = ?1 AND topic_id = ?2",
    )
    .bind(lecture_id)
    .bind(topic_id)
    .fetch_one(db)
    .await?;
    Ok(count > 0)
}

pub async fn find_topic_by_id<'e, E>(db: E, id: &str) -> Result<Option<Topic>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Topic>(&format!("SELECT {TOPIC_COLUMNS} FROM topics t WHERE t.id = ?"))
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Topics in the lecture's list order.
pub async fn list_topics_for_lecture<'e, E>(db: E, lecture_id: &str) -> Result<Vec<Topic>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Topic>(&format!(
        r#"
        SELECT {TOPIC_COLUMNS}
        FROM lecture_topics lt
        JOIN topics t ON t.id = lt.topic_id
        WHERE lt.lecture_id = ?
        ORDER BY lt.position
        "#
    ))
    .bind(lecture_id)
    .fetch_all(db)
    .await
}

/// Listed topics of every lecture in the course, grouped by lecture in list order.
pub async fn list_topics_for_course<'e, E>(db: E, course_id: &str) -> Result<Vec<Topic>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Topic>(&format!(
        r#"
        SELECT {TOPIC_COLUMNS}
        FROM lectures l
        JOIN lecture_topics lt ON lt.lecture_id = l.id
        JOIN topics t ON t.id = lt.topic_id
        WHERE l.course_id = ?
        ORDER BY l.id, lt.position
        "#
    ))
    .bind(course_id)
    .fetch_all(db)
    .await
}

pub async fn update_topic<'e, E>(db: E, id: &str, topic: &ValidTopic) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE topics
        SET name = ?1,
            description = ?2,
            resource_type = ?3,
            resource_link = ?4
        WHERE id = ?5
        "#,
    )
    .bind(&topic.name)
    .bind(&topic.description)
    .bind(topic.resource_type)
    .bind(&topic.resource_link)
    .bind(id)
    .execute(db)
    .await?
    .rows_affected();
    Ok(result > 0)
}

pub async fn delete_topic<'e, E>(db: E, id: &str) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM topics WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();
    Ok(result > 0)
}
