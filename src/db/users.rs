use sqlx::SqliteExecutor;

use crate::db::{new_id, now};
use crate::models::{Role, User};

const USER_COLUMNS: &str = "id, name, email, phone_number, password_hash, role, created_at";

pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone_number: Option<&'a str>,
    pub password_hash: &'a str,
    pub role: Role,
}

pub async fn insert_user<'e, E>(db: E, new: NewUser<'_>) -> Result<User, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let user = User {
        id: new_id(),
        name: new.name.trim().to_string(),
        email: new.email.trim().to_lowercase(),
        phone_number: new.phone_number.map(str::to_string),
        password_hash: new.password_hash.to_string(),
        role: new.role,
        created_at: now(),
    };

    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, phone_number, password_hash, role, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.phone_number)
    .bind(&user.password_hash)
    .bind(user.role)
    .bind(&user.created_at)
    .execute(db)
    .await?;

    Ok(user)
}

pub async fn find_user_by_id<'e, E>(db: E, id: &str) -> Result<Option<User>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn find_user_by_email<'e, E>(db: E, email: &str) -> Result<Option<User>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
        .bind(email.trim().to_lowercase())
        .fetch_optional(db)
        .await
}

/// Students ordered by name. `search` matches name or email, case-insensitively.
pub async fn list_students<'e, E>(db: E, search: Option<&str>) -> Result<Vec<User>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let pattern = search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s));

    sqlx::query_as::<_, User>(&format!(
        r#"
        SELECT {USER_COLUMNS} FROM users
        WHERE role = 'student'
          AND (?1 IS NULL OR name LIKE ?1 OR email LIKE ?1)
        ORDER BY name, id
        "#
    ))
    .bind(pattern)
    .fetch_all(db)
    .await
}

pub async fn delete_user<'e, E>(db: E, id: &str) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;

    fn student<'a>(name: &'a str, email: &'a str) -> NewUser<'a> {
        NewUser {
            name,
            email,
            phone_number: None,
            password_hash: "hash",
            role: Role::Student,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_user() {
        let pool = connect_in_memory().await.expect("Failed to create test db");

        let user = insert_user(&pool, student("Ada", "Ada@Example.com"))
            .await
            .expect("Failed to insert user");
        assert_eq!(user.email, "ada@example.com");

        let by_email = find_user_by_email(&pool, "ADA@example.com")
            .await
            .expect("Failed to query user")
            .expect("User not found");
        assert_eq!(by_email.id, user.id);
        assert_eq!(by_email.role, Role::Student);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let pool = connect_in_memory().await.expect("Failed to create test db");

        insert_user(&pool, student("Ada", "ada@example.com"))
            .await
            .expect("Failed to insert user");
        let err = insert_user(&pool, student("Other", "ada@example.com"))
            .await
            .expect_err("duplicate email must fail");
        assert!(matches!(err, sqlx::Error::Database(ref e) if e.is_unique_violation()));
    }

    #[tokio::test]
    async fn test_list_students_search() {
        let pool = connect_in_memory().await.expect("Failed to create test db");

        insert_user(&pool, student("Ada Lovelace", "ada@example.com")).await.unwrap();
        insert_user(&pool, student("Grace Hopper", "grace@navy.mil")).await.unwrap();
        insert_user(
            &pool,
            NewUser { role: Role::Admin, ..student("Admin", "admin@example.com") },
        )
        .await
        .unwrap();

        let all = list_students(&pool, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let found = list_students(&pool, Some("NAVY")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Grace Hopper");
    }
}
