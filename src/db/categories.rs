use sqlx::SqliteExecutor;

use crate::db::{new_id, now};
use crate::models::{Category, CategorySummary};

pub async fn insert_category<'e, E>(db: E, name: &str) -> Result<Category, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let category = Category {
        id: new_id(),
        name: name.to_string(),
        created_at: now(),
    };

    sqlx::query("INSERT INTO categories (id, name, created_at) VALUES (?1, ?2, ?3)")
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.created_at)
        .execute(db)
        .await?;

    Ok(category)
}

pub async fn find_category_by_id<'e, E>(db: E, id: &str) -> Result<Option<Category>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Category>("SELECT id, name, created_at FROM categories WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Whether another category (other than `exclude_id`) already uses `name`.
pub async fn name_taken<'e, E>(db: E, name: &str, exclude_id: Option<&str>) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM categories WHERE name = ?1 AND (?2 IS NULL OR id != ?2)",
    )
    .bind(name)
    .bind(exclude_id)
    .fetch_one(db)
    .await?;

    Ok(count > 0)
}

pub async fn rename_category<'e, E>(db: E, id: &str, name: &str) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("UPDATE categories SET name = ?1 WHERE id = ?2")
        .bind(name)
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

pub async fn count_courses_in_category<'e, E>(db: E, id: &str) -> Result<i64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM courses WHERE category_id = ?")
        .bind(id)
        .fetch_one(db)
        .await?;
    Ok(count)
}

pub async fn delete_category<'e, E>(db: E, id: &str) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM categories WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

/// Every category with the titles of the courses filed under it.
pub async fn list_category_summaries<'e, E>(db: E) -> Result<Vec<CategorySummary>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let rows: Vec<(String, String, Option<String>)> = sqlx::query_as(
        r#"
        SELECT cat.id, cat.name, c.title
        FROM categories cat
        LEFT JOIN courses c ON c.category_id = cat.id
        ORDER BY cat.name, cat.id, c.title
        "#,
    )
    .fetch_all(db)
    .await?;

    let mut summaries: Vec<CategorySummary> = Vec::new();
    for (id, name, title) in rows {
        let needs_new = summaries.last().is_none_or(|s| s.id != id);
        if needs_new {
            summaries.push(CategorySummary {
                id,
                name,
                course_count: 0,
                course_names: Vec::new(),
            });
        }
        if let (Some(summary), Some(title)) = (summaries.last_mut(), title) {
            summary.course_count += 1;
            summary.course_names.push(title);
        }
    }

    Ok(summaries)
}
