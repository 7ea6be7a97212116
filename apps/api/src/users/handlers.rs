use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::user::{EmployerProfileRow, Role, User};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
    pub employer_profile: Option<EmployerProfileRow>,
}

#[derive(Debug, Deserialize)]
pub struct OnboardingRequest {
    pub role: Role,
    pub company_name: Option<String>,
    pub website: Option<String>,
}

/// Returns the trimmed company name an employer onboarding must carry.
fn validate_onboarding(req: &OnboardingRequest) -> Result<Option<String>, AppError> {
    match req.role {
        Role::Admin => Err(AppError::Forbidden),
        Role::Jobseeker => Ok(None),
        Role::Employer => req
            .company_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| Some(name.to_string()))
            .ok_or_else(|| {
                AppError::Validation("company_name is required for employers".to_string())
            }),
    }
}

async fn load_profile(
    state: &AppState,
    user: &User,
) -> Result<Option<EmployerProfileRow>, AppError> {
    let profile = sqlx::query_as::<_, EmployerProfileRow>(
        "SELECT * FROM employer_profiles WHERE user_id = $1",
    )
    .bind(user.id)
    .fetch_optional(&state.db)
    .await?;
    Ok(profile)
}

/// GET /api/v1/me
pub async fn handle_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<MeResponse>, AppError> {
    let employer_profile = load_profile(&state, &user).await?;
    Ok(Json(MeResponse {
        user,
        employer_profile,
    }))
}

/// POST /api/v1/onboarding
///
/// Sets the caller's role and marks onboarding complete. Admin can never be self-assigned.
pub async fn handle_onboarding(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<OnboardingRequest>,
) -> Result<Json<MeResponse>, AppError> {
    let company_name = validate_onboarding(&req)?;

    let mut tx = state.db.begin().await?;

    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET role = $1, onboarding_completed = TRUE WHERE id = $2 RETURNING *",
    )
    .bind(req.role.as_str())
    .bind(user.id)
    .fetch_one(&mut *tx)
    .await?;

    if let Some(company_name) = company_name {
        sqlx::query(
            r#"
            INSERT INTO employer_profiles (user_id, company_name, website)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id)
            DO UPDATE SET company_name = EXCLUDED.company_name, website = EXCLUDED.website
            "#,
        )
        .bind(user.id)
        .bind(&company_name)
        .bind(req.website.as_deref().map(str::trim))
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    info!("User {} completed onboarding as {}", user.id, req.role);

    let employer_profile = load_profile(&state, &user).await?;
    Ok(Json(MeResponse {
        user,
        employer_profile,
    }))
}
