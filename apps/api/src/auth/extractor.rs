use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use chrono::Utc;

use crate::auth::db::get_user_from_token;
use crate::errors::AppError;
use crate::models::user::{Role, User};
use crate::state::AppState;

/// The authenticated caller. Handlers take it as an argument; there is no ambient session.
///
/// ```ignore
/// async fn handler(CurrentUser(user): CurrentUser) -> ... { }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    /// Admins pass every role check.
    pub fn require_role(&self, role: Role) -> Result<&User, AppError> {
        let actual = self.0.role();
        if actual == role || actual == Role::Admin {
            Ok(&self.0)
        } else {
            Err(AppError::Forbidden)
        }
    }

    pub fn require_admin(&self) -> Result<&User, AppError> {
        self.require_role(Role::Admin)
    }
}

/// Extracts the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AppError::Unauthorized)
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;

        let user = get_user_from_token(&state.db, token, Utc::now())
            .await?
            .ok_or(AppError::Unauthorized)?;

        Ok(CurrentUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use uuid::Uuid;

    fn user_with_role(role: &str) -> CurrentUser {
        CurrentUser(User {
            id: Uuid::new_v4(),
            email: "someone@example.com".to_string(),
            password_hash: String::new(),
            name: "Someone".to_string(),
            role: role.to_string(),
            onboarding_completed: true,
            created_at: Utc::now(),
        })
    }

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc123");
    }

    #[test]
    fn test_missing_or_malformed_header_is_unauthorized() {
        let headers = HeaderMap::new();
        assert!(matches!(bearer_token(&headers), Err(AppError::Unauthorized)));

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert!(matches!(bearer_token(&headers), Err(AppError::Unauthorized)));

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert!(matches!(bearer_token(&headers), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_role_checks() {
        let employer = user_with_role("employer");
        assert!(employer.require_role(Role::Employer).is_ok());
        assert!(matches!(
            employer.require_admin(),
            Err(AppError::Forbidden)
        ));

        let admin = user_with_role("admin");
        assert!(admin.require_role(Role::Employer).is_ok());
        assert!(admin.require_role(Role::Jobseeker).is_ok());

        let seeker = user_with_role("jobseeker");
        assert!(matches!(
            seeker.require_role(Role::Employer),
            Err(AppError::Forbidden)
        ));
    }
}
