use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqliteExecutor, SqlitePool};

use crate::models::{Course, CourseQuery, Faq, RatingView, User};

const COURSE_COLUMNS: &str = r#"
    c.id, c.title, c.short_description, c.description, c.category_id, c.level,
    c.language, c.featured, c.price, c.discount_price, c.discount_enabled,
    c.course_image, c.video_url, c.instructor_id, c.pricing_model,
    COALESCE((SELECT AVG(r.rating) FROM course_ratings r WHERE r.course_id = c.id), 0.0) AS average_rating,
    c.created_at, c.updated_at
"#;

pub async fn insert_course<'e, E>(db: E, course: &Course) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO courses
            (id, title, short_description, description, category_id, level, language,
            featured, price, discount_price, discount_enabled, course_image, video_url,
            instructor_id, pricing_model, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
        "#,
    )
    .bind(&course.id)
    .bind(&course.title)
    .bind(&course.short_description)
    .bind(&course.description)
    .bind(&course.category_id)
    .bind(course.level)
    .bind(&course.language)
    .bind(course.featured)
    .bind(course.price)
    .bind(course.discount_price)
    .bind(course.discount_enabled)
    .bind(&course.course_image)
    .bind(&course.video_url)
    .bind(&course.instructor_id)
    .bind(course.pricing_model)
    .bind(&course.created_at)
    .bind(&course.updated_at)
    .execute(db)
    .await?;

    Ok(())
}

pub async fn update_course<'e, E>(db: E, course: &Course) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        UPDATE courses
        SET title = ?1,
            short_description = ?2,
            description = ?3,
            category_id = ?4,
            level = ?5,
            language = ?6,
            featured = ?7,
            price = ?8,
            discount_price = ?9,
            discount_enabled = ?10,
            course_image = ?11,
            video_url = ?12,
            pricing_model = ?13,
            updated_at = ?14
        WHERE id = ?15
        "#,
    )
    .bind(&course.title)
    .bind(&course.short_description)
    .bind(&course.description)
    .bind(&course.category_id)
    .bind(course.level)
    .bind(&course.language)
    .bind(course.featured)
    .bind(course.price)
    .bind(course.discount_price)
    .bind(course.discount_enabled)
    .bind(&course.course_image)
    .bind(&course.video_url)
    .bind(course.pricing_model)
    .bind(&course.updated_at)
    .bind(&course.id)
    .execute(db)
    .await?;

    Ok(())
}

pub async fn find_course_by_id<'e, E>(db: E, id: &str) -> Result<Option<Course>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Course>(&format!("SELECT {COURSE_COLUMNS} FROM courses c WHERE c.id = ?"))
        .bind(id)
        .fetch_optional(db)
        .await
}

fn push_course_filters<'a>(builder: &mut QueryBuilder<'a, Sqlite>, query: &'a CourseQuery) {
    builder.push(" WHERE 1 = 1");
    if let Some(category) = &query.category {
        builder.push(" AND c.category_id = ").push_bind(category);
    }
    if let Some(level) = query.level {
        builder.push(" AND c.level = ").push_bind(level);
    }
}

/// One page of courses plus the total number of matches.
pub async fn list_courses(db: &SqlitePool, query: &CourseQuery) -> Result<(Vec<Course>, i64), sqlx::Error> {
    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM courses c");
    push_course_filters(&mut count, query);
    let (total,): (i64,) = count.build_query_as().fetch_one(db).await?;

    let limit = i64::from(query.limit());
    let offset = i64::from(query.page() - 1) * limit;

    let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT {COURSE_COLUMNS} FROM courses c"));
    push_course_filters(&mut select, query);
    // Sort column and direction come from closed enums, never from raw input.
    select
        .push(format!(" ORDER BY {} {}, c.id", query.sort.column(), query.order.keyword()))
        .push(" LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    let courses = select.build_query_as::<Course>().fetch_all(db).await?;
    Ok((courses, total))
}

/// Courses the student has an Enrollment for.
pub async fn list_courses_for_student<'e, E>(db: E, student_id: &str) -> Result<Vec<Course>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Course>(&format!(
        r#"
        SELECT {COURSE_COLUMNS}
        FROM courses c
        JOIN enrollments e ON e.course_id = c.id
        WHERE e.student_id = ?
        ORDER BY e.enrolled_at, c.id
        "#
    ))
    .bind(student_id)
    .fetch_all(db)
    .await
}

/// Courses taught by the instructor, newest first.
pub async fn list_courses_by_instructor<'e, E>(db: E, instructor_id: &str) -> Result<Vec<Course>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COURSE_COLUMNS} FROM courses c WHERE c.instructor_id = ? ORDER BY c.created_at DESC, c.id"
    ))
    .bind(instructor_id)
    .fetch_all(db)
    .await
}

pub async fn add_enrolled_student<'e, E>(db: E, course_id: &str, student_id: &str) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("INSERT OR IGNORE INTO course_students (course_id, student_id) VALUES (?1, ?2)")
        .bind(course_id)
        .bind(student_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn remove_student_from_all_courses<'e, E>(db: E, student_id: &str) -> Result<u64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM course_students WHERE student_id = ?")
        .bind(student_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

pub async fn is_enrolled_student<'e, E>(db: E, course_id: &str, student_id: &str) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM course_students WHERE course_id = ?1 AND student_id = ?2",
    )
    .bind(course_id)
    .bind(student_id)
    .fetch_one(db)
    .await?;
    Ok(count > 0)
}

pub async fn list_enrolled_students<'e, E>(db: E, course_id: &str) -> Result<Vec<User>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.name, u.email, u.phone_number, u.password_hash, u.role, u.created_at
        FROM course_students cs
        JOIN users u ON u.id = cs.student_id
        WHERE cs.course_id = ?
        ORDER BY u.name, u.id
        "#,
    )
    .bind(course_id)
    .fetch_all(db)
    .await
}

/// Adds a `course_students` entry for every enrollment that lacks one.
pub async fn add_missing_enrolled_students<'e, E>(db: E) -> Result<u64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO course_students (course_id, student_id)
        SELECT course_id, student_id FROM enrollments
        "#,
    )
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

/// Drops `course_students` entries with no backing enrollment.
pub async fn drop_stale_enrolled_students<'e, E>(db: E) -> Result<u64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        DELETE FROM course_students
        WHERE NOT EXISTS (
            SELECT 1 FROM enrollments e
            WHERE e.course_id = course_students.course_id
              AND e.student_id = course_students.student_id
        )
        "#,
    )
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

pub async fn upsert_rating<'e, E>(
    db: E,
    course_id: &str,
    user_id: &str,
    rating: i64,
    comment: Option<&str>,
    now: &str,
) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO course_ratings (course_id, user_id, rating, comment, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(course_id, user_id) DO UPDATE SET
            rating = excluded.rating,
            comment = excluded.comment
        "#,
    )
    .bind(course_id)
    .bind(user_id)
    .bind(rating)
    .bind(comment)
    .bind(now)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn list_ratings<'e, E>(db: E, course_id: &str) -> Result<Vec<RatingView>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, RatingView>(
        r#"
        SELECT r.user_id, u.name AS user_name, r.rating, r.comment, r.created_at
        FROM course_ratings r
        JOIN users u ON u.id = r.user_id
        WHERE r.course_id = ?
        ORDER BY r.created_at, r.user_id
        "#,
    )
    .bind(course_id)
    .fetch_all(db)
    .await
}

pub async fn delete_ratings_by_user<'e, E>(db: E, user_id: &str) -> Result<u64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM course_ratings WHERE user_id = ?")
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

pub async fn list_faqs<'e, E>(db: E, course_id: &str) -> Result<Vec<Faq>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Faq>(
        "SELECT question, answer FROM course_faqs WHERE course_id = ? ORDER BY position",
    )
    .bind(course_id)
    .fetch_all(db)
    .await
}

/// Replaces the course's FAQ list with `faqs`, keeping their order.
pub async fn replace_faqs(conn: &mut SqliteConnection, course_id: &str, faqs: &[Faq]) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM course_faqs WHERE course_id = ?")
        .bind(course_id)
        .execute(&mut *conn)
        .await?;

    for (position, faq) in faqs.iter().enumerate() {
        sqlx::query(
            "INSERT INTO course_faqs (course_id, position, question, answer) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(course_id)
        .bind(position as i64)
        .bind(faq.question.trim())
        .bind(faq.answer.trim())
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Removes a course and everything hanging off it. Run inside a transaction.
pub async fn delete_course_tree(conn: &mut SqliteConnection, course_id: &str) -> Result<bool, sqlx::Error> {
    let statements = [
        "DELETE FROM user_progress WHERE lecture_id IN (SELECT id FROM lectures WHERE course_id = ?1)",
        "DELETE FROM lecture_topics WHERE lecture_id IN (SELECT id FROM lectures WHERE course_id = ?1)",
        "DELETE FROM topics WHERE lecture_id IN (SELECT id FROM lectures WHERE course_id = ?1)",
        "DELETE FROM lectures WHERE course_id = ?1",
        "DELETE FROM enrollments WHERE course_id = ?1",
        "DELETE FROM course_students WHERE course_id = ?1",
        "DELETE FROM course_ratings WHERE course_id = ?1",
        "DELETE FROM course_faqs WHERE course_id = ?1",
    ];
    for sql in statements {
        sqlx::query(sql).bind(course_id).execute(&mut *conn).await?;
    }

    let deleted = sqlx::query("DELETE FROM courses WHERE id = ?1")
        .bind(course_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    Ok(deleted > 0)
}
