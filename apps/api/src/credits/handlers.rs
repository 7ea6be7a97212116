//! Axum route handlers for the Credits API.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::config::{days_after, MAX_DAYS};
use crate::credits::alerts::{compute_alerts, AlertThresholds, CreditAlert};
use crate::credits::ledger::{
    balance, expiring_soon, get_subscription, grant_credits, renew_subscription, MAX_GRANT,
};
use crate::errors::AppError;
use crate::models::credit::{SubscriptionRow, SubscriptionTier};
use crate::models::user::Role;
use crate::state::AppState;

const DEFAULT_PERIOD_DAYS: i64 = 30;
const MAX_PERIOD_DAYS: i64 = 366;

#[derive(Debug, Serialize)]
pub struct CreditSummary {
    pub balance: i64,
    pub expiring_soon: i64,
    pub subscription: Option<SubscriptionRow>,
    pub subscription_active: bool,
    pub alerts: Vec<CreditAlert>,
}

#[derive(Debug, Deserialize)]
pub struct GrantCreditsRequest {
    pub employer_id: Uuid,
    pub quantity: i64,
    pub validity_days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct GrantCreditsResponse {
    pub granted: u64,
    pub balance: i64,
}

#[derive(Debug, Deserialize)]
pub struct RenewSubscriptionRequest {
    pub employer_id: Uuid,
    pub tier: SubscriptionTier,
    pub period_days: Option<i64>,
}

fn validate_grant(req: &GrantCreditsRequest) -> Result<(), AppError> {
    if !(1..=MAX_GRANT).contains(&req.quantity) {
        return Err(AppError::Validation(format!(
            "quantity must be between 1 and {MAX_GRANT}"
        )));
    }
    if req
        .validity_days
        .is_some_and(|days| !(1..=MAX_DAYS).contains(&days))
    {
        return Err(AppError::Validation(format!(
            "validity_days must be between 1 and {MAX_DAYS}"
        )));
    }
    Ok(())
}

fn validate_period(period_days: i64) -> Result<(), AppError> {
    if !(1..=MAX_PERIOD_DAYS).contains(&period_days) {
        return Err(AppError::Validation(format!(
            "period_days must be between 1 and {MAX_PERIOD_DAYS}"
        )));
    }
    Ok(())
}

async fn ensure_employer_exists(state: &AppState, employer_id: Uuid) -> Result<(), AppError> {
    let role: Option<String> = sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
        .bind(employer_id)
        .fetch_optional(&state.db)
        .await?;

    match role.as_deref() {
        Some("employer") => Ok(()),
        Some(_) => Err(AppError::Validation(format!(
            "User {employer_id} is not an employer"
        ))),
        None => Err(AppError::NotFound(format!("Employer {employer_id} not found"))),
    }
}

/// GET /api/v1/credits
pub async fn handle_get_credits(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<CreditSummary>, AppError> {
    let user = current.require_role(Role::Employer)?;
    let now = Utc::now();

    let balance = balance(&state.db, user.id, now).await?;
    let expiring_soon = expiring_soon(&state.db, user.id, now).await?;
    let subscription = get_subscription(&state.db, user.id).await?;
    let subscription_active = subscription.as_ref().is_some_and(|s| s.is_active(now));

    let alerts = compute_alerts(
        balance,
        expiring_soon,
        AlertThresholds {
            warning: state.config.credit_warning_threshold,
            critical: state.config.credit_critical_threshold,
        },
    );

    Ok(Json(CreditSummary {
        balance,
        expiring_soon,
        subscription,
        subscription_active,
        alerts,
    }))
}

/// POST /api/v1/admin/credits/grant
///
/// Stands in for purchase webhooks: an admin adds credits to an employer's balance.
pub async fn handle_grant_credits(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<GrantCreditsRequest>,
) -> Result<(StatusCode, Json<GrantCreditsResponse>), AppError> {
    let admin = current.require_admin()?;
    validate_grant(&req)?;
    ensure_employer_exists(&state, req.employer_id).await?;

    let now = Utc::now();
    let validity = req.validity_days.unwrap_or(state.config.credit_validity_days);
    let expires_at = days_after(now, validity).ok_or_else(|| {
        AppError::Validation(format!("validity_days {validity} is out of range"))
    })?;
    let granted = grant_credits(
        &state.db,
        req.employer_id,
        req.quantity,
        expires_at,
        &format!("admin_grant:{}", admin.id),
    )
    .await?;

    let balance = balance(&state.db, req.employer_id, now).await?;
    Ok((
        StatusCode::CREATED,
        Json(GrantCreditsResponse { granted, balance }),
    ))
}

/// POST /api/v1/admin/subscriptions
pub async fn handle_renew_subscription(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<RenewSubscriptionRequest>,
) -> Result<Json<SubscriptionRow>, AppError> {
    current.require_admin()?;
    let period_days = req.period_days.unwrap_or(DEFAULT_PERIOD_DAYS);
    validate_period(period_days)?;
    ensure_employer_exists(&state, req.employer_id).await?;

    let subscription =
        renew_subscription(&state.db, req.employer_id, req.tier, period_days, Utc::now()).await?;
    Ok(Json(subscription))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(quantity: i64, validity_days: Option<i64>) -> GrantCreditsRequest {
        GrantCreditsRequest {
            employer_id: Uuid::new_v4(),
            quantity,
            validity_days,
        }
    }

    #[test]
    fn test_grant_quantity_bounds() {
        assert!(validate_grant(&grant(1, None)).is_ok());
        assert!(validate_grant(&grant(MAX_GRANT, Some(30))).is_ok());
        assert!(validate_grant(&grant(0, None)).is_err());
        assert!(validate_grant(&grant(MAX_GRANT + 1, None)).is_err());
        assert!(validate_grant(&grant(1, Some(0))).is_err());
        assert!(validate_grant(&grant(1, Some(MAX_DAYS))).is_ok());
        assert!(matches!(
            validate_grant(&grant(1, Some(1_000_000_000))),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_period_bounds() {
        assert!(validate_period(30).is_ok());
        assert!(validate_period(0).is_err());
        assert!(validate_period(MAX_PERIOD_DAYS + 1).is_err());
    }
}
