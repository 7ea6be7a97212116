use std::str::FromStr;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};

/// Upper bound for every configured or requested day count.
pub const MAX_DAYS: i64 = 3650;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    /// Empty when LLM query parsing is not configured.
    pub anthropic_api_key: String,
    pub enable_llm_query_parsing: bool,
    /// Region whose cities scope non-remote searches.
    pub site_region: String,
    pub job_expiry_days: i64,
    pub credit_validity_days: i64,
    pub credit_warning_threshold: i64,
    pub credit_critical_threshold: i64,
    pub activation_requires_credit: bool,
    /// Zero disables the background sweeper.
    pub sweep_interval_secs: u64,
    pub session_ttl_days: i64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let config = Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").unwrap_or_default(),
            enable_llm_query_parsing: parse_env("ENABLE_LLM_QUERY_PARSING", false)?,
            site_region: std::env::var("SITE_REGION").unwrap_or_else(|_| "209".to_string()),
            job_expiry_days: parse_env("JOB_EXPIRY_DAYS", 30)?,
            credit_validity_days: parse_env("CREDIT_VALIDITY_DAYS", 90)?,
            credit_warning_threshold: parse_env("CREDIT_WARNING_THRESHOLD", 2)?,
            credit_critical_threshold: parse_env("CREDIT_CRITICAL_THRESHOLD", 0)?,
            activation_requires_credit: parse_env("ACTIVATION_REQUIRES_CREDIT", true)?,
            sweep_interval_secs: parse_env("SWEEP_INTERVAL_SECS", 3600)?,
            session_ttl_days: parse_env("SESSION_TTL_DAYS", 30)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.credit_critical_threshold > self.credit_warning_threshold {
            bail!(
                "CREDIT_CRITICAL_THRESHOLD ({}) must not exceed CREDIT_WARNING_THRESHOLD ({})",
                self.credit_critical_threshold,
                self.credit_warning_threshold
            );
        }
        for (key, days) in [
            ("JOB_EXPIRY_DAYS", self.job_expiry_days),
            ("CREDIT_VALIDITY_DAYS", self.credit_validity_days),
            ("SESSION_TTL_DAYS", self.session_ttl_days),
        ] {
            if !(1..=MAX_DAYS).contains(&days) {
                bail!("{key} must be between 1 and {MAX_DAYS}, got {days}");
            }
        }
        if self.enable_llm_query_parsing && self.anthropic_api_key.is_empty() {
            bail!("ENABLE_LLM_QUERY_PARSING is set but ANTHROPIC_API_KEY is empty");
        }
        Ok(())
    }
}

/// `start + days`, or `None` when the day count cannot be represented.
pub fn days_after(start: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    Duration::try_days(days).and_then(|d| start.checked_add_signed(d))
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/jobboard_test".to_string(),
        redis_url: "redis://127.0.0.1/".to_string(),
        anthropic_api_key: String::new(),
        enable_llm_query_parsing: false,
        site_region: "209".to_string(),
        job_expiry_days: 30,
        credit_validity_days: 90,
        credit_warning_threshold: 2,
        credit_critical_threshold: 0,
        activation_requires_credit: true,
        sweep_interval_secs: 0,
        session_ttl_days: 30,
        port: 8080,
        rust_log: "info".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_critical_above_warning_is_rejected() {
        let mut config = test_config();
        config.credit_critical_threshold = 5;
        config.credit_warning_threshold = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_llm_parsing_requires_api_key() {
        let mut config = test_config();
        config.enable_llm_query_parsing = true;
        assert!(config.validate().is_err());

        config.anthropic_api_key = "sk-test".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_day_counts_are_bounded() {
        let mut config = test_config();
        config.job_expiry_days = 0;
        assert!(config.validate().is_err());

        let mut config = test_config();
        config.credit_validity_days = 1_000_000_000;
        assert!(config.validate().is_err());

        let mut config = test_config();
        config.session_ttl_days = MAX_DAYS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_days_after_rejects_unrepresentable_counts() {
        let now = Utc::now();
        assert_eq!(days_after(now, 30), Some(now + Duration::days(30)));
        assert_eq!(days_after(now, 1_000_000_000), None);
        assert_eq!(days_after(now, i64::MAX), None);
    }

    #[test]
    fn test_parse_env_falls_back_to_default() {
        let value: i64 = parse_env("JOBBOARD_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }
}
