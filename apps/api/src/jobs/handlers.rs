//! Axum route handlers for job postings.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::{db::get_user_from_token, extractor::bearer_token, CurrentUser};
use crate::errors::AppError;
use crate::jobs::lifecycle::{
    activate_job, ensure_owner, load_job, pause_job, validate_job, JobDraft, ValidJob,
};
use crate::models::job::JobRow;
use crate::models::user::{Role, User};
use crate::state::AppState;

/// Partial update; absent fields keep their current value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateJobRequest {
    pub title: Option<String>,
    pub company: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub job_type: Option<String>,
    pub categories: Option<Vec<String>>,
    pub is_remote: Option<bool>,
}

impl UpdateJobRequest {
    fn apply_to(self, job: &JobRow) -> JobDraft {
        JobDraft {
            title: self.title.unwrap_or_else(|| job.title.clone()),
            company: self.company.unwrap_or_else(|| job.company.clone()),
            description: self.description.unwrap_or_else(|| job.description.clone()),
            location: self.location.unwrap_or_else(|| job.location.clone()),
            salary_min: self.salary_min.or(job.salary_min),
            salary_max: self.salary_max.or(job.salary_max),
            job_type: self.job_type.unwrap_or_else(|| job.job_type.clone()),
            categories: self.categories.unwrap_or_else(|| job.categories.clone()),
            is_remote: self.is_remote.unwrap_or(job.is_remote),
        }
    }
}

/// The caller, if a valid bearer token was sent. Anonymous access is not an error here.
async fn optional_user(state: &AppState, headers: &HeaderMap) -> Result<Option<User>, AppError> {
    match bearer_token(headers) {
        Ok(token) => Ok(get_user_from_token(&state.db, token, Utc::now()).await?),
        Err(_) => Ok(None),
    }
}

/// POST /api/v1/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(draft): Json<JobDraft>,
) -> Result<(StatusCode, Json<JobRow>), AppError> {
    let user = current.require_role(Role::Employer)?;
    let valid = validate_job(&draft)?;

    let job = sqlx::query_as::<_, JobRow>(
        r#"
        INSERT INTO jobs (id, employer_id, title, company, description, location,
                          salary_min, salary_max, job_type, categories, is_remote, region, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 'draft')
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(&valid.title)
    .bind(&valid.company)
    .bind(&valid.description)
    .bind(&valid.location)
    .bind(valid.salary_min)
    .bind(valid.salary_max)
    .bind(valid.job_type.as_str())
    .bind(&valid.categories)
    .bind(valid.is_remote)
    .bind(valid.region)
    .fetch_one(&state.db)
    .await?;

    info!("Draft job {} created by employer {}", job.id, user.id);
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/v1/jobs/:id
///
/// Open jobs are public. Anything else is visible only to its owner (or an admin) and
/// reads as not found to everyone else.
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<JobRow>, AppError> {
    let job = load_job(&state.db, job_id).await?;
    if job.is_open(Utc::now()) {
        return Ok(Json(job));
    }

    let viewer = optional_user(&state, &headers).await?;
    match viewer {
        Some(user) if ensure_owner(&user, &job).is_ok() => Ok(Json(job)),
        _ => Err(AppError::NotFound(format!("Job {job_id} not found"))),
    }
}

/// PATCH /api/v1/jobs/:id
pub async fn handle_update_job(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(job_id): Path<Uuid>,
    Json(req): Json<UpdateJobRequest>,
) -> Result<Json<JobRow>, AppError> {
    let user = current.require_role(Role::Employer)?;
    let job = load_job(&state.db, job_id).await?;
    ensure_owner(user, &job)?;

    let status = job.status();
    if !status.is_editable() {
        return Err(AppError::Conflict(format!(
            "A {status} job cannot be edited"
        )));
    }

    let ValidJob {
        title,
        company,
        description,
        location,
        salary_min,
        salary_max,
        job_type,
        categories,
        is_remote,
        region,
    } = validate_job(&req.apply_to(&job))?;

    let updated = sqlx::query_as::<_, JobRow>(
        r#"
        UPDATE jobs
        SET title = $2, company = $3, description = $4, location = $5, salary_min = $6,
            salary_max = $7, job_type = $8, categories = $9, is_remote = $10, region = $11,
            updated_at = now()
        WHERE id = $1 AND status IN ('draft', 'paused')
        RETURNING *
        "#,
    )
    .bind(job.id)
    .bind(title)
    .bind(company)
    .bind(description)
    .bind(location)
    .bind(salary_min)
    .bind(salary_max)
    .bind(job_type.as_str())
    .bind(categories)
    .bind(is_remote)
    .bind(region)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::Conflict("Job status changed concurrently".to_string()))?;

    Ok(Json(updated))
}

/// GET /api/v1/employer/jobs
pub async fn handle_list_employer_jobs(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<JobRow>>, AppError> {
    let user = current.require_role(Role::Employer)?;
    let jobs = sqlx::query_as::<_, JobRow>(
        "SELECT * FROM jobs WHERE employer_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(jobs))
}

/// POST /api/v1/jobs/:id/activate
pub async fn handle_activate_job(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobRow>, AppError> {
    let user = current.require_role(Role::Employer)?;
    let job = activate_job(
        &state.db,
        user,
        job_id,
        Utc::now(),
        state.config.job_expiry_days,
        state.config.activation_requires_credit,
    )
    .await?;
    Ok(Json(job))
}

/// POST /api/v1/jobs/:id/pause
pub async fn handle_pause_job(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobRow>, AppError> {
    let user = current.require_role(Role::Employer)?;
    Ok(Json(pause_job(&state.db, user, job_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn existing() -> JobRow {
        let now = Utc::now();
        JobRow {
            id: Uuid::new_v4(),
            employer_id: Uuid::new_v4(),
            title: "Line Cook".to_string(),
            company: "Delta Diner".to_string(),
            description: "Breakfast shift".to_string(),
            location: "Lodi, CA".to_string(),
            salary_min: Some(35_000),
            salary_max: Some(42_000),
            job_type: "part_time".to_string(),
            categories: vec!["Food Service".to_string()],
            status: "draft".to_string(),
            is_remote: false,
            region: Some("209".to_string()),
            posted_at: None,
            expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_partial_update_keeps_unset_fields() {
        let job = existing();
        let draft = UpdateJobRequest {
            title: Some("Prep Cook".to_string()),
            location: Some("Sacramento, CA".to_string()),
            ..Default::default()
        }
        .apply_to(&job);

        assert_eq!(draft.title, "Prep Cook");
        assert_eq!(draft.company, "Delta Diner");
        assert_eq!(draft.salary_max, Some(42_000));
        assert_eq!(draft.job_type, "part_time");

        let valid = validate_job(&draft).unwrap();
        assert_eq!(valid.region, Some("916"));
    }

    #[test]
    fn test_partial_update_is_revalidated() {
        let job = existing();
        let draft = UpdateJobRequest {
            salary_min: Some(50_000),
            ..Default::default()
        }
        .apply_to(&job);
        assert!(matches!(validate_job(&draft), Err(AppError::Validation(_))));
    }
}
