use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{error, info, warn};

use crate::auth::TokenAuthority;
use crate::auth::password::{hash_password, verify_password};
use crate::config::AdminSeed;
use crate::db::users::{self, NewUser};
use crate::error::AppError;
use crate::models::{AuthResponse, LoginRequest, RegisterRequest, Role, User};

pub struct AuthService {
    db: SqlitePool,
    tokens: Arc<dyn TokenAuthority>,
}

impl AuthService {
    pub fn new(db: SqlitePool, tokens: Arc<dyn TokenAuthority>) -> Self {
        Self { db, tokens }
    }

    /// Self-registration always creates a student.
    pub async fn register(&self, req: RegisterRequest) -> Result<AuthResponse, AppError> {
        req.validate()?;

        if users::find_user_by_email(&self.db, &req.email).await?.is_some() {
            return Err(AppError::Conflict("Email is already registered".to_string()));
        }

        let password_hash = hash_blocking(req.password).await?;
        let user = users::insert_user(
            &self.db,
            NewUser {
                name: &req.name,
                email: &req.email,
                phone_number: req.phone_number.as_deref(),
                password_hash: &password_hash,
                role: Role::Student,
            },
        )
        .await?;

        info!("registered student {}", user.id);
        self.respond(user)
    }

    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, AppError> {
        let invalid = || AppError::Unauthenticated("Invalid email or password".to_string());

        let user = users::find_user_by_email(&self.db, &req.email)
            .await?
            .ok_or_else(invalid)?;

        let password = req.password;
        let stored = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
            .await
            .map_err(|e| {
                error!("password verification task failed: {}", e);
                AppError::InternalServerError
            })?;
        if !matches {
            warn!("failed login for {}", user.email);
            return Err(invalid());
        }

        self.respond(user)
    }

    pub async fn me(&self, user_id: &str) -> Result<User, AppError> {
        users::find_user_by_id(&self.db, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// Creates the configured admin account unless the email is already taken.
    pub async fn ensure_admin(&self, seed: &AdminSeed) -> Result<(), AppError> {
        if let Some(existing) = users::find_user_by_email(&self.db, &seed.email).await? {
            if existing.role != Role::Admin {
                warn!("admin seed email {} belongs to a non-admin account", existing.email);
            }
            return Ok(());
        }

        let password_hash = hash_blocking(seed.password.clone()).await?;
        let admin = users::insert_user(
            &self.db,
            NewUser {
                name: &seed.name,
                email: &seed.email,
                phone_number: None,
                password_hash: &password_hash,
                role: Role::Admin,
            },
        )
        .await?;

        info!("seeded admin account {}", admin.email);
        Ok(())
    }

    fn respond(&self, user: User) -> Result<AuthResponse, AppError> {
        let token = self.tokens.issue(&user.id, user.role)?;
        Ok(AuthResponse { user, token })
    }
}

async fn hash_blocking(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| {
            error!("password hashing task failed: {}", e);
            AppError::InternalServerError
        })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtAuthority;
    use crate::db::connect_in_memory;

    fn service(pool: &SqlitePool) -> AuthService {
        AuthService::new(pool.clone(), Arc::new(JwtAuthority::new("test-secret".to_string(), 1)))
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Ada".to_string(),
            email: email.to_string(),
            password: "secret1".to_string(),
            phone_number: None,
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        let auth = service(&pool);

        let registered = auth.register(register_request("ada@example.com")).await.expect("register");
        assert_eq!(registered.user.role, Role::Student);

        let logged_in = auth
            .login(LoginRequest {
                email: "ADA@example.com".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .expect("login");
        assert_eq!(logged_in.user.id, registered.user.id);

        let err = auth
            .login(LoginRequest {
                email: "ada@example.com".to_string(),
                password: "wrong".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        let auth = service(&pool);

        auth.register(register_request("ada@example.com")).await.expect("register");
        let err = auth.register(register_request("ada@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_admin_seed_is_idempotent() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        let auth = service(&pool);
        let seed = AdminSeed {
            name: "Root".to_string(),
            email: "root@example.com".to_string(),
            password: "changeme".to_string(),
        };

        auth.ensure_admin(&seed).await.expect("seed");
        auth.ensure_admin(&seed).await.expect("seed again");

        let admin = users::find_user_by_email(&pool, "root@example.com")
            .await
            .unwrap()
            .expect("Admin not found");
        assert_eq!(admin.role, Role::Admin);
    }
}
