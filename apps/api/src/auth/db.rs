use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::crypto::{generate_token, hash_token};
use crate::config::days_after;
use crate::errors::AppError;
use crate::models::user::User;

/// Creates a session and returns the plaintext token to hand to the client.
pub async fn create_session(
    pool: &PgPool,
    user_id: Uuid,
    ttl_days: i64,
    now: DateTime<Utc>,
) -> Result<String, AppError> {
    let expires_at = days_after(now, ttl_days).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("Session TTL of {ttl_days} days is out of range"))
    })?;
    let token = generate_token();

    sqlx::query(
        "INSERT INTO sessions (id, user_id, token_hash, expires_at) VALUES ($1, $2, $3, $4)",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(hash_token(&token))
    .bind(expires_at)
    .execute(pool)
    .await?;

    Ok(token)
}

/// Resolves an unexpired session token to its user.
pub async fn get_user_from_token(
    pool: &PgPool,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT u.*
        FROM users u
        JOIN sessions s ON s.user_id = u.id
        WHERE s.token_hash = $1 AND s.expires_at > $2
        "#,
    )
    .bind(hash_token(token))
    .bind(now)
    .fetch_optional(pool)
    .await
}

pub async fn delete_session(pool: &PgPool, token: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
        .bind(hash_token(token))
        .execute(pool)
        .await?;
    Ok(())
}
