//! Identity collaborator: token issuance/verification, password hashing and
//! the request extractor that injects the verified caller into handlers.

pub mod extractor;
pub mod password;

use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::Role;

pub use extractor::AuthUser;

/// The verified `(user_id, role)` pair a token carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
}

impl Identity {
    pub fn require_role(&self, role: Role) -> Result<(), AppError> {
        if self.role == role {
            return Ok(());
        }
        tracing::warn!(user_id = %self.user_id, required = role.as_str(), "role check failed");
        Err(AppError::Forbidden(format!("Requires {} role", role.as_str())))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

pub trait TokenAuthority: Send + Sync {
    fn issue(&self, user_id: &str, role: Role) -> Result<String, AppError>;
    fn verify(&self, token: &str) -> Result<Identity, AppError>;
}

/// HS256 JWTs signed with a shared secret.
pub struct JwtAuthority {
    secret: String,
    ttl: Duration,
}

impl JwtAuthority {
    pub fn new(secret: String, ttl_days: i64) -> Self {
        Self {
            secret,
            ttl: Duration::days(ttl_days),
        }
    }
}

impl fmt::Debug for JwtAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtAuthority")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenAuthority for JwtAuthority {
    fn issue(&self, user_id: &str, role: Role) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| {
            tracing::error!("failed to sign token: {}", e);
            AppError::InternalServerError
        })
    }

    fn verify(&self, token: &str) -> Result<Identity, AppError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                AppError::Unauthenticated("Token expired".to_string())
            }
            _ => AppError::Unauthenticated("Invalid token".to_string()),
        })?;

        Ok(Identity {
            user_id: data.claims.sub,
            role: data.claims.role,
        })
    }
}
