//! Periodic expiry pass over credits, jobs and subscriptions.

use std::time::Duration;

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::auth::CurrentUser;
use crate::credits::ledger::{expire_lapsed_subscriptions, expire_stale_credits};
use crate::errors::AppError;
use crate::jobs::lifecycle::expire_jobs;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub credits_expired: u64,
    pub jobs_expired: u64,
    pub subscriptions_expired: u64,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        *self == SweepReport::default()
    }
}

pub async fn run_sweep(pool: &PgPool, now: DateTime<Utc>) -> Result<SweepReport, sqlx::Error> {
    let report = SweepReport {
        credits_expired: expire_stale_credits(pool, now).await?,
        jobs_expired: expire_jobs(pool, now).await?,
        subscriptions_expired: expire_lapsed_subscriptions(pool, now).await?,
    };

    if !report.is_empty() {
        info!(
            "Sweep expired {} credit(s), {} job(s), {} subscription(s)",
            report.credits_expired, report.jobs_expired, report.subscriptions_expired
        );
    }
    Ok(report)
}

/// Runs `run_sweep` every `interval_secs`. Returns `None` when the interval is zero.
pub fn spawn_sweeper(pool: PgPool, interval_secs: u64) -> Option<JoinHandle<()>> {
    if interval_secs == 0 {
        info!("Background sweeper disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = run_sweep(&pool, Utc::now()).await {
                error!("Sweep failed: {e}");
            }
        }
    }))
}

/// POST /api/v1/admin/sweep
pub async fn handle_sweep(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<SweepReport>, AppError> {
    current.require_admin()?;
    Ok(Json(run_sweep(&state.db, Utc::now()).await?))
}
