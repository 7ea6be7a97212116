//! Axum route handlers for job applications.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::jobs::lifecycle::{ensure_owner, load_job};
use crate::models::application::{ApplicationStatus, JobApplicationRow};
use crate::models::user::Role;
use crate::state::AppState;

const MAX_COVER_LETTER_LEN: usize = 10_000;

#[derive(Debug, Default, Deserialize)]
pub struct ApplyRequest {
    pub cover_letter: Option<String>,
    pub resume_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ApplicationStatus,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_apply(req: ApplyRequest) -> Result<ApplyRequest, AppError> {
    let cover_letter = non_blank(req.cover_letter);
    if cover_letter
        .as_ref()
        .is_some_and(|c| c.chars().count() > MAX_COVER_LETTER_LEN)
    {
        return Err(AppError::Validation(format!(
            "cover_letter cannot exceed {MAX_COVER_LETTER_LEN} characters"
        )));
    }

    let resume_url = non_blank(req.resume_url);
    if let Some(url) = &resume_url {
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(AppError::Validation(
                "resume_url must be an http(s) URL".to_string(),
            ));
        }
    }

    Ok(ApplyRequest {
        cover_letter,
        resume_url,
    })
}

/// POST /api/v1/jobs/:id/applications
///
/// One application per user per job; the unique constraint decides races.
pub async fn handle_apply(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(job_id): Path<Uuid>,
    Json(req): Json<ApplyRequest>,
) -> Result<(StatusCode, Json<JobApplicationRow>), AppError> {
    let user = current.require_role(Role::Jobseeker)?;
    let req = validate_apply(req)?;

    let job = load_job(&state.db, job_id).await?;
    if !job.is_open(Utc::now()) {
        return Err(AppError::NotFound(format!("Job {job_id} not found")));
    }

    let application = sqlx::query_as::<_, JobApplicationRow>(
        r#"
        INSERT INTO job_applications (id, job_id, user_id, status, cover_letter, resume_url)
        VALUES ($1, $2, $3, 'applied', $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(job.id)
    .bind(user.id)
    .bind(req.cover_letter)
    .bind(req.resume_url)
    .fetch_one(&state.db)
    .await
    .map_err(|e| AppError::from_unique_violation(e, "You have already applied to this job"))?;

    info!("User {} applied to job {}", user.id, job.id);
    Ok((StatusCode::CREATED, Json(application)))
}

/// GET /api/v1/applications
pub async fn handle_list_my_applications(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<JobApplicationRow>>, AppError> {
    let applications = sqlx::query_as::<_, JobApplicationRow>(
        "SELECT * FROM job_applications WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(applications))
}

/// GET /api/v1/jobs/:id/applications
pub async fn handle_list_job_applications(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Vec<JobApplicationRow>>, AppError> {
    let user = current.require_role(Role::Employer)?;
    let job = load_job(&state.db, job_id).await?;
    ensure_owner(user, &job)?;

    let applications = sqlx::query_as::<_, JobApplicationRow>(
        "SELECT * FROM job_applications WHERE job_id = $1 ORDER BY created_at ASC",
    )
    .bind(job.id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(applications))
}

/// PATCH /api/v1/applications/:id/status
pub async fn handle_update_application_status(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(application_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<JobApplicationRow>, AppError> {
    let user = current.require_role(Role::Employer)?;

    let application = sqlx::query_as::<_, JobApplicationRow>(
        "SELECT * FROM job_applications WHERE id = $1",
    )
    .bind(application_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Application {application_id} not found")))?;

    let job = load_job(&state.db, application.job_id).await?;
    ensure_owner(user, &job)?;

    let current_status: ApplicationStatus = application
        .status
        .parse()
        .map_err(|e: String| AppError::Internal(anyhow::anyhow!(e)))?;
    if !current_status.can_transition_to(req.status) {
        return Err(AppError::Conflict(format!(
            "Cannot move a {current_status} application to {}",
            req.status
        )));
    }

    let updated = sqlx::query_as::<_, JobApplicationRow>(
        r#"
        UPDATE job_applications SET status = $2, updated_at = now()
        WHERE id = $1 AND status = $3
        RETURNING *
        "#,
    )
    .bind(application.id)
    .bind(req.status.as_str())
    .bind(current_status.as_str())
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::Conflict("Application status changed concurrently".to_string()))?;

    info!(
        "Application {} moved {current_status} -> {}",
        updated.id, req.status
    );
    Ok(Json(updated))
}
