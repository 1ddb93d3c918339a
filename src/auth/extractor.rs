use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::auth::Identity;
use crate::db::users;
use crate::error::AppError;
use crate::models::Role;
use crate::state::AppState;

/// The authenticated caller, resolved from the bearer token.
///
/// The user is reloaded on every request, so a deleted account stops
/// authenticating immediately and the role always comes from the store.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub name: String,
    pub role: Role,
}

impl AuthUser {
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.id.clone(),
            role: self.role,
        }
    }

    pub fn require_role(&self, role: Role) -> Result<(), AppError> {
        self.identity().require_role(role)
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthenticated("Missing bearer token".to_string()))?;

    header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthenticated("Malformed authorization header".to_string()))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let identity = state.auth.verify(token)?;

        let user = users::find_user_by_id(&state.db, &identity.user_id)
            .await?
            .ok_or_else(|| AppError::Unauthenticated("User no longer exists".to_string()))?;

        Ok(AuthUser {
            id: user.id,
            name: user.name,
            role: user.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).expect("build request").into_parts().0
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc"))).unwrap(), "abc");
        assert!(bearer_token(&parts_with(None)).is_err());
        assert!(bearer_token(&parts_with(Some("Basic abc"))).is_err());
        assert!(bearer_token(&parts_with(Some("Bearer   "))).is_err());
    }

    #[test]
    fn test_require_role() {
        let student = AuthUser {
            id: "s1".to_string(),
            name: "Ada".to_string(),
            role: Role::Student,
        };
        assert!(student.require_role(Role::Student).is_ok());
        assert!(matches!(student.require_role(Role::Admin), Err(AppError::Forbidden(_))));
    }
}
