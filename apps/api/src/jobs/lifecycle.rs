//! Job posting lifecycle: draft → active → (paused | expired).
//!
//! Activation from draft is the only transition that costs a credit, and it spends the
//! credit inside the same transaction that flips the status.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::config::days_after;
use crate::credits::ledger::consume_credit;
use crate::errors::AppError;
use crate::models::job::{JobRow, JobStatus, JobType};
use crate::models::user::{Role, User};
use crate::regions::region_for_location;

const MAX_TITLE_LEN: usize = 200;
const MAX_CATEGORIES: usize = 10;

/// Listing fields shared by create and update, after merging.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobDraft {
    pub title: String,
    pub company: String,
    pub description: String,
    pub location: String,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub job_type: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub is_remote: bool,
}

/// A validated draft with the job type resolved and text trimmed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidJob {
    pub title: String,
    pub company: String,
    pub description: String,
    pub location: String,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub job_type: JobType,
    pub categories: Vec<String>,
    pub is_remote: bool,
    pub region: Option<&'static str>,
}

fn required(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

pub fn validate_job(draft: &JobDraft) -> Result<ValidJob, AppError> {
    let title = required("title", &draft.title)?;
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::Validation(format!(
            "title cannot exceed {MAX_TITLE_LEN} characters"
        )));
    }
    let company = required("company", &draft.company)?;
    let description = required("description", &draft.description)?;
    let location = required("location", &draft.location)?;

    if draft.salary_min.is_some_and(|v| v < 0) || draft.salary_max.is_some_and(|v| v < 0) {
        return Err(AppError::Validation(
            "salary cannot be negative".to_string(),
        ));
    }
    if let (Some(min), Some(max)) = (draft.salary_min, draft.salary_max) {
        if min > max {
            return Err(AppError::Validation(
                "salary_min cannot exceed salary_max".to_string(),
            ));
        }
    }

    let job_type = JobType::parse_label(&draft.job_type).ok_or_else(|| {
        AppError::Validation(format!("Unknown job_type '{}'", draft.job_type))
    })?;

    let mut categories: Vec<String> = Vec::new();
    for category in draft.categories.iter().map(|c| c.trim()).filter(|c| !c.is_empty()) {
        if !categories.iter().any(|c| c.eq_ignore_ascii_case(category)) {
            categories.push(category.to_string());
        }
    }
    if categories.len() > MAX_CATEGORIES {
        return Err(AppError::Validation(format!(
            "at most {MAX_CATEGORIES} categories are allowed"
        )));
    }

    let region = region_for_location(&location);

    Ok(ValidJob {
        title,
        company,
        description,
        location,
        salary_min: draft.salary_min,
        salary_max: draft.salary_max,
        job_type,
        categories,
        is_remote: draft.is_remote,
        region,
    })
}

/// Owners manage their own jobs; admins manage any.
pub fn ensure_owner(user: &User, job: &JobRow) -> Result<(), AppError> {
    if job.employer_id == user.id || user.role() == Role::Admin {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

pub fn check_transition(from: JobStatus, to: JobStatus) -> Result<(), AppError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(AppError::Conflict(format!(
            "Cannot move a {from} job to {to}"
        )))
    }
}

/// Whether moving `from` → active spends a credit.
pub fn activation_costs_credit(from: JobStatus, requires_credit: bool) -> bool {
    requires_credit && from == JobStatus::Draft
}

pub async fn load_job(pool: &PgPool, job_id: Uuid) -> Result<JobRow, AppError> {
    sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
        .bind(job_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))
}

/// Publishes a draft or resumes a paused job.
///
/// The row is locked for the whole transaction. When a credit is due and none is
/// available the transaction rolls back and the job is left untouched.
pub async fn activate_job(
    pool: &PgPool,
    user: &User,
    job_id: Uuid,
    now: DateTime<Utc>,
    expiry_days: i64,
    requires_credit: bool,
) -> Result<JobRow, AppError> {
    let mut tx = pool.begin().await?;

    let job = sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1 FOR UPDATE")
        .bind(job_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    ensure_owner(user, &job)?;
    let from = job.status();
    check_transition(from, JobStatus::Active)?;

    if activation_costs_credit(from, requires_credit) {
        let credit = consume_credit(&mut *tx, job.employer_id, job.id, now).await?;
        if credit.is_none() {
            return Err(AppError::PaymentRequired(
                "No valid job posting credits available".to_string(),
            ));
        }
    }

    // Resuming keeps the original posting window.
    let (posted_at, expires_at) = match from {
        JobStatus::Paused => (job.posted_at.unwrap_or(now), job.expires_at),
        _ => {
            let expires_at = days_after(now, expiry_days).ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "Job expiry of {expiry_days} days is out of range"
                ))
            })?;
            (now, Some(expires_at))
        }
    };

    let updated = sqlx::query_as::<_, JobRow>(
        r#"
        UPDATE jobs
        SET status = 'active', posted_at = $2, expires_at = $3, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(job.id)
    .bind(posted_at)
    .bind(expires_at)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    info!("Job {} activated (was {from})", updated.id);
    Ok(updated)
}

pub async fn pause_job(pool: &PgPool, user: &User, job_id: Uuid) -> Result<JobRow, AppError> {
    let job = load_job(pool, job_id).await?;
    ensure_owner(user, &job)?;
    check_transition(job.status(), JobStatus::Paused)?;

    // The status guard turns a concurrent transition into a conflict instead of a lost update.
    let updated = sqlx::query_as::<_, JobRow>(
        r#"
        UPDATE jobs SET status = 'paused', updated_at = now()
        WHERE id = $1 AND status = 'active'
        RETURNING *
        "#,
    )
    .bind(job.id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::Conflict("Job status changed concurrently".to_string()))?;

    info!("Job {} paused", updated.id);
    Ok(updated)
}

/// Moves active and paused jobs past their expiry to `expired`.
pub async fn expire_jobs(pool: &PgPool, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE jobs SET status = 'expired', updated_at = now()
        WHERE status IN ('active', 'paused') AND expires_at IS NOT NULL AND expires_at <= $1
        "#,
    )
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
