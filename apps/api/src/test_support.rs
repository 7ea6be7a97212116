//! Fixtures for tests that run against a real Postgres.
//!
//! `pool()` yields `None` when `DATABASE_URL` is unset; tests return early in that case.

use std::sync::Arc;

use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::test_config;
use crate::db::create_pool;
use crate::models::job::{JobRow, JobStatus};
use crate::models::user::{Role, User};
use crate::regions::{cities_for_region, region_for_location};
use crate::search::query_parser::HeuristicQueryParser;
use crate::state::AppState;

pub async fn pool() -> anyhow::Result<Option<PgPool>> {
    match std::env::var("DATABASE_URL") {
        Ok(url) => Ok(Some(create_pool(&url).await?)),
        Err(_) => Ok(None),
    }
}

pub fn state(db: PgPool) -> AppState {
    let config = test_config();
    let allow_list = cities_for_region(&config.site_region);
    AppState {
        db,
        config,
        query_parser: Arc::new(HeuristicQueryParser),
        allow_list: Arc::new(allow_list),
    }
}

pub async fn insert_user(pool: &PgPool, role: Role) -> anyhow::Result<User> {
    let id = Uuid::new_v4();
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email, password_hash, name, role, onboarding_completed)
        VALUES ($1, $2, 'unused', 'Test User', $3, TRUE)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(format!("{id}@example.com"))
    .bind(role.as_str())
    .fetch_one(pool)
    .await?;
    Ok(user)
}

/// Inserts a job whose region matches its location. Active jobs get a 30-day window.
pub async fn insert_job(
    pool: &PgPool,
    employer_id: Uuid,
    status: JobStatus,
    location: &str,
) -> anyhow::Result<JobRow> {
    let now = Utc::now();
    let (posted_at, expires_at) = match status {
        JobStatus::Draft => (None, None),
        _ => (Some(now), Some(now + Duration::days(30))),
    };

    let job = sqlx::query_as::<_, JobRow>(
        r#"
        INSERT INTO jobs (id, employer_id, title, company, description, location, job_type,
                          status, region, posted_at, expires_at)
        VALUES ($1, $2, 'Forklift Operator', 'Valley Logistics', 'Operate forklifts', $3,
                'full_time', $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(employer_id)
    .bind(location)
    .bind(status.as_str())
    .bind(region_for_location(location))
    .bind(posted_at)
    .bind(expires_at)
    .fetch_one(pool)
    .await?;
    Ok(job)
}
