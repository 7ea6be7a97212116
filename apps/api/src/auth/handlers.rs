//! Axum route handlers for signup, login and logout.

use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::crypto::{hash_password, verify_password};
use crate::auth::db::{create_session, delete_session};
use crate::auth::extractor::{bearer_token, CurrentUser};
use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_signup(req: &SignupRequest) -> Result<(), AppError> {
    let email = normalize_email(&req.email);
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("A valid email is required".to_string()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    Ok(())
}

/// POST /api/v1/auth/signup
pub async fn handle_signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    validate_signup(&req)?;

    let password_hash = hash_password(&req.password)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {e}")))?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email, password_hash, name)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(normalize_email(&req.email))
    .bind(password_hash)
    .bind(req.name.trim())
    .fetch_one(&state.db)
    .await
    .map_err(|e| AppError::from_unique_violation(e, "An account with this email already exists"))?;

    let token = create_session(&state.db, user.id, state.config.session_ttl_days, Utc::now()).await?;
    info!("User {} signed up", user.id);

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// POST /api/v1/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(normalize_email(&req.email))
        .fetch_optional(&state.db)
        .await?
        .filter(|user| verify_password(&req.password, &user.password_hash))
        .ok_or(AppError::Unauthorized)?;

    let token = create_session(&state.db, user.id, state.config.session_ttl_days, Utc::now()).await?;

    Ok(Json(AuthResponse { token, user }))
}

/// POST /api/v1/auth/logout
pub async fn handle_logout(
    State(state): State<AppState>,
    _user: CurrentUser,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let token = bearer_token(&headers)?;
    delete_session(&state.db, token).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(email: &str, password: &str, name: &str) -> SignupRequest {
        SignupRequest {
            email: email.to_string(),
            password: password.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_email_is_normalized() {
        assert_eq!(normalize_email("  Jane@Example.COM "), "jane@example.com");
    }

    #[test]
    fn test_signup_validation() {
        assert!(validate_signup(&signup("jane@example.com", "longenough", "Jane")).is_ok());
        assert!(validate_signup(&signup("not-an-email", "longenough", "Jane")).is_err());
        assert!(validate_signup(&signup("jane@example.com", "short", "Jane")).is_err());
        assert!(validate_signup(&signup("jane@example.com", "longenough", "  ")).is_err());
    }
}
