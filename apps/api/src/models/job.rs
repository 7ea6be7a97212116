use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Draft,
    Active,
    Paused,
    Expired,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Draft => "draft",
            JobStatus::Active => "active",
            JobStatus::Paused => "paused",
            JobStatus::Expired => "expired",
        }
    }

    /// draft → active → (paused | expired); paused jobs may resume or expire.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Draft, JobStatus::Active)
                | (JobStatus::Active, JobStatus::Paused)
                | (JobStatus::Active, JobStatus::Expired)
                | (JobStatus::Paused, JobStatus::Active)
                | (JobStatus::Paused, JobStatus::Expired)
        )
    }

    /// Listing content can only be edited while the job is not live.
    pub fn is_editable(&self) -> bool {
        matches!(self, JobStatus::Draft | JobStatus::Paused)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(JobStatus::Draft),
            "active" => Ok(JobStatus::Active),
            "paused" => Ok(JobStatus::Paused),
            "expired" => Ok(JobStatus::Expired),
            other => Err(format!("unknown job status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    Internship,
    Temporary,
    Freelance,
}

impl JobType {
    /// Storage form, e.g. `full_time`.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullTime => "full_time",
            JobType::PartTime => "part_time",
            JobType::Contract => "contract",
            JobType::Internship => "internship",
            JobType::Temporary => "temporary",
            JobType::Freelance => "freelance",
        }
    }

    /// Human form, e.g. `full-time`.
    pub fn label(&self) -> &'static str {
        match self {
            JobType::FullTime => "full-time",
            JobType::PartTime => "part-time",
            JobType::Contract => "contract",
            JobType::Internship => "internship",
            JobType::Temporary => "temporary",
            JobType::Freelance => "freelance",
        }
    }

    /// Accepts `full-time`, `full time`, `full_time`, `fulltime` in any case.
    pub fn parse_label(raw: &str) -> Option<JobType> {
        let normalized: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect();

        match normalized.as_str() {
            "fulltime" => Some(JobType::FullTime),
            "parttime" => Some(JobType::PartTime),
            "contract" => Some(JobType::Contract),
            "internship" => Some(JobType::Internship),
            "temporary" => Some(JobType::Temporary),
            "freelance" => Some(JobType::Freelance),
            _ => None,
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub employer_id: Uuid,
    pub title: String,
    pub company: String,
    pub description: String,
    pub location: String,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub job_type: String,
    pub categories: Vec<String>,
    pub status: String,
    pub is_remote: bool,
    pub region: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRow {
    /// Rows with an unrecognised status are treated as expired.
    pub fn status(&self) -> JobStatus {
        self.status.parse().unwrap_or(JobStatus::Expired)
    }

    /// Active and not past its expiry.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.status() == JobStatus::Active && self.expires_at.map_or(true, |at| at > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn job(status: &str, expires_at: Option<DateTime<Utc>>) -> JobRow {
        let now = Utc::now();
        JobRow {
            id: Uuid::new_v4(),
            employer_id: Uuid::new_v4(),
            title: "Forklift Operator".to_string(),
            company: "Valley Logistics".to_string(),
            description: "Operate forklifts".to_string(),
            location: "Stockton, CA".to_string(),
            salary_min: None,
            salary_max: None,
            job_type: "full_time".to_string(),
            categories: vec![],
            status: status.to_string(),
            is_remote: false,
            region: None,
            posted_at: None,
            expires_at,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_allowed_transitions() {
        assert!(JobStatus::Draft.can_transition_to(JobStatus::Active));
        assert!(JobStatus::Active.can_transition_to(JobStatus::Paused));
        assert!(JobStatus::Active.can_transition_to(JobStatus::Expired));
        assert!(JobStatus::Paused.can_transition_to(JobStatus::Active));
    }

    #[test]
    fn test_forbidden_transitions() {
        assert!(!JobStatus::Draft.can_transition_to(JobStatus::Paused));
        assert!(!JobStatus::Draft.can_transition_to(JobStatus::Expired));
        assert!(!JobStatus::Expired.can_transition_to(JobStatus::Active));
        assert!(!JobStatus::Active.can_transition_to(JobStatus::Draft));
        assert!(!JobStatus::Active.can_transition_to(JobStatus::Active));
    }

    #[test]
    fn test_job_type_accepts_separator_variants() {
        assert_eq!(JobType::parse_label("full-time"), Some(JobType::FullTime));
        assert_eq!(JobType::parse_label("Full Time"), Some(JobType::FullTime));
        assert_eq!(JobType::parse_label("part_time"), Some(JobType::PartTime));
        assert_eq!(JobType::parse_label("FULLTIME"), Some(JobType::FullTime));
        assert_eq!(JobType::parse_label("gig"), None);
    }

    #[test]
    fn test_job_type_label_is_hyphenated() {
        assert_eq!(JobType::FullTime.to_string(), "full-time");
        assert_eq!(JobType::FullTime.as_str(), "full_time");
    }

    #[test]
    fn test_is_open_respects_status_and_expiry() {
        let now = Utc::now();
        assert!(job("active", None).is_open(now));
        assert!(job("active", Some(now + Duration::days(1))).is_open(now));
        assert!(!job("active", Some(now - Duration::seconds(1))).is_open(now));
        assert!(!job("paused", None).is_open(now));
    }
}
