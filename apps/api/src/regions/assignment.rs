use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::regions::region_for_location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentReport {
    /// Jobs lacking a region that were examined.
    pub total_jobs: u64,
    pub assigned_jobs: u64,
}

#[derive(Debug, sqlx::FromRow)]
struct UnassignedJob {
    id: Uuid,
    location: String,
}

/// Pairs each unassigned job with the region its location maps to.
/// Jobs whose location matches no city are left out.
fn plan_assignments(jobs: &[UnassignedJob]) -> Vec<(Uuid, &'static str)> {
    jobs.iter()
        .filter_map(|job| region_for_location(&job.location).map(|region| (job.id, region)))
        .collect()
}

/// Tags every job that has no region yet. Already-assigned jobs are never touched,
/// so a second run reports zero assignments.
pub async fn assign_regions(pool: &PgPool) -> Result<AssignmentReport, sqlx::Error> {
    let jobs: Vec<UnassignedJob> =
        sqlx::query_as("SELECT id, location FROM jobs WHERE region IS NULL")
            .fetch_all(pool)
            .await?;

    let plan = plan_assignments(&jobs);
    let mut assigned_jobs = 0;

    for (job_id, region) in plan {
        let result = sqlx::query(
            "UPDATE jobs SET region = $1, updated_at = now() WHERE id = $2 AND region IS NULL",
        )
        .bind(region)
        .bind(job_id)
        .execute(pool)
        .await?;
        assigned_jobs += result.rows_affected();
    }

    let report = AssignmentReport {
        total_jobs: jobs.len() as u64,
        assigned_jobs,
    };
    info!(
        "Region assignment: {} of {} unassigned jobs tagged",
        report.assigned_jobs, report.total_jobs
    );
    Ok(report)
}
