use chrono::{DateTime, Duration, Utc};
use sqlx::{PgExecutor, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::config::days_after;
use crate::errors::AppError;
use crate::models::credit::{SubscriptionRow, SubscriptionTier};

/// Largest number of credits a single grant may carry.
pub const MAX_GRANT: i64 = 100;

/// Window used for the "credits expiring soon" count.
pub const EXPIRY_WARNING_DAYS: i64 = 7;

/// Counts unexpired, unused credits.
pub async fn balance(
    pool: &PgPool,
    employer_id: Uuid,
    now: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM job_credits WHERE employer_id = $1 AND is_used = FALSE AND expires_at > $2",
    )
    .bind(employer_id)
    .bind(now)
    .fetch_one(pool)
    .await
}

/// Counts valid credits that lapse within `EXPIRY_WARNING_DAYS`.
pub async fn expiring_soon(
    pool: &PgPool,
    employer_id: Uuid,
    now: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM job_credits
        WHERE employer_id = $1 AND is_used = FALSE AND expires_at > $2 AND expires_at <= $3
        "#,
    )
    .bind(employer_id)
    .bind(now)
    .bind(now + Duration::days(EXPIRY_WARNING_DAYS))
    .fetch_one(pool)
    .await
}

/// Consumes the soonest-expiring valid credit in one conditional UPDATE.
///
/// Returns the consumed credit id, or `None` when the employer has no valid credit.
/// Concurrent callers never consume the same row: the inner SELECT skips locked rows
/// and the outer UPDATE re-checks `is_used`.
pub async fn consume_credit<'e, E>(
    executor: E,
    employer_id: Uuid,
    job_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Option<Uuid>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let consumed: Option<Uuid> = sqlx::query_scalar(
        r#"
        UPDATE job_credits
        SET is_used = TRUE, used_at = $3, used_for_job_id = $2
        WHERE id = (
            SELECT id FROM job_credits
            WHERE employer_id = $1 AND is_used = FALSE AND expires_at > $3
            ORDER BY expires_at ASC
            LIMIT 1
            FOR UPDATE SKIP LOCKED
        )
        AND is_used = FALSE
        RETURNING id
        "#,
    )
    .bind(employer_id)
    .bind(job_id)
    .bind(now)
    .fetch_optional(executor)
    .await?;

    if let Some(credit_id) = consumed {
        info!("Consumed credit {credit_id} for job {job_id} (employer {employer_id})");
    }
    Ok(consumed)
}

/// Inserts `quantity` credits expiring at `expires_at`.
pub async fn grant_credits<'e, E>(
    executor: E,
    employer_id: Uuid,
    quantity: i64,
    expires_at: DateTime<Utc>,
    source: &str,
) -> Result<u64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let ids: Vec<Uuid> = (0..quantity).map(|_| Uuid::new_v4()).collect();

    let result = sqlx::query(
        r#"
        INSERT INTO job_credits (id, employer_id, expires_at, source)
        SELECT id, $2, $3, $4 FROM UNNEST($1::uuid[]) AS t(id)
        "#,
    )
    .bind(ids)
    .bind(employer_id)
    .bind(expires_at)
    .bind(source)
    .execute(executor)
    .await?;

    info!(
        "Granted {} credit(s) to employer {employer_id} from {source}",
        result.rows_affected()
    );
    Ok(result.rows_affected())
}

/// Marks every unused credit past its expiry as used. Returns how many were retired.
pub async fn expire_stale_credits(pool: &PgPool, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE job_credits SET is_used = TRUE, used_at = $1 WHERE is_used = FALSE AND expires_at <= $1",
    )
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn get_subscription(
    pool: &PgPool,
    employer_id: Uuid,
) -> Result<Option<SubscriptionRow>, sqlx::Error> {
    sqlx::query_as::<_, SubscriptionRow>("SELECT * FROM subscriptions WHERE employer_id = $1")
        .bind(employer_id)
        .fetch_optional(pool)
        .await
}

/// Starts or renews a subscription through `now + period_days` and grants the tier's
/// credits for that period, atomically.
pub async fn renew_subscription(
    pool: &PgPool,
    employer_id: Uuid,
    tier: SubscriptionTier,
    period_days: i64,
    now: DateTime<Utc>,
) -> Result<SubscriptionRow, AppError> {
    let period_end = days_after(now, period_days).ok_or_else(|| {
        AppError::Validation(format!("period_days {period_days} is out of range"))
    })?;
    let mut tx = pool.begin().await?;

    let subscription = sqlx::query_as::<_, SubscriptionRow>(
        r#"
        INSERT INTO subscriptions (id, employer_id, tier, status, current_period_end)
        VALUES ($1, $2, $3, 'active', $4)
        ON CONFLICT (employer_id) DO UPDATE
        SET tier = EXCLUDED.tier,
            status = 'active',
            current_period_end = EXCLUDED.current_period_end,
            updated_at = now()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(employer_id)
    .bind(tier.as_str())
    .bind(period_end)
    .fetch_one(&mut *tx)
    .await?;

    grant_credits(
        &mut *tx,
        employer_id,
        tier.credits_per_period(),
        period_end,
        &format!("subscription:{tier}"),
    )
    .await?;

    tx.commit().await?;

    info!("Subscription for employer {employer_id} renewed at tier {tier} until {period_end}");
    Ok(subscription)
}

/// Marks active subscriptions whose period has ended as expired.
pub async fn expire_lapsed_subscriptions(
    pool: &PgPool,
    now: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE subscriptions SET status = 'expired', updated_at = now()
        WHERE status = 'active' AND current_period_end <= $1
        "#,
    )
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
