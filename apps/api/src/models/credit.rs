use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    Starter,
    Standard,
    Pro,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Starter => "starter",
            SubscriptionTier::Standard => "standard",
            SubscriptionTier::Pro => "pro",
        }
    }

    /// Posting credits granted each billing period.
    pub fn credits_per_period(&self) -> i64 {
        match self {
            SubscriptionTier::Starter => 3,
            SubscriptionTier::Standard => 10,
            SubscriptionTier::Pro => 30,
        }
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SubscriptionRow {
    pub id: Uuid,
    pub employer_id: Uuid,
    pub tier: String,
    pub status: String,
    pub current_period_end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionRow {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status == "active" && self.current_period_end > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_arrives_as_snake_case_json() {
        let tier: SubscriptionTier = serde_json::from_str("\"standard\"").unwrap();
        assert_eq!(tier, SubscriptionTier::Standard);
        assert_eq!(tier.credits_per_period(), 10);
        assert!(serde_json::from_str::<SubscriptionTier>("\"platinum\"").is_err());
    }

    #[test]
    fn test_subscription_activity() {
        let now = Utc::now();
        let row = SubscriptionRow {
            id: Uuid::new_v4(),
            employer_id: Uuid::new_v4(),
            tier: SubscriptionTier::Pro.to_string(),
            status: "active".to_string(),
            current_period_end: now + chrono::Duration::days(1),
            created_at: now,
            updated_at: now,
        };
        assert!(row.is_active(now));
        assert!(!row.is_active(now + chrono::Duration::days(2)));
    }
}
