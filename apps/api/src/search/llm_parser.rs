//! LLM-backed query parsing. One model call per uncached query, no retries: any failure
//! is returned as `AppError::Llm` and the search fails closed.

use async_trait::async_trait;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::search::models::{JobType, ParsedQuery};
use crate::search::prompts::{QUERY_PARSE_PROMPT_TEMPLATE, QUERY_PARSE_SYSTEM};
use crate::search::query_parser::QueryParser;

const CACHE_TTL_SECS: u64 = 24 * 60 * 60;
const CACHE_KEY_PREFIX: &str = "query_parse:v2:";

/// The JSON shape the model is asked to return.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmParsedQuery {
    pub keywords: Vec<String>,
    pub location: Option<String>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub job_type: Option<String>,
    pub remote: Option<bool>,
}

impl From<LlmParsedQuery> for ParsedQuery {
    fn from(raw: LlmParsedQuery) -> Self {
        let job_type = raw.job_type.as_deref().and_then(|label| {
            let parsed = JobType::parse_label(label);
            if parsed.is_none() {
                warn!("LLM returned unknown job type '{label}', ignoring");
            }
            parsed
        });

        let mut keywords: Vec<String> = Vec::new();
        for keyword in raw.keywords {
            let keyword = keyword.trim().to_lowercase();
            if !keyword.is_empty() && !keywords.contains(&keyword) {
                keywords.push(keyword);
            }
        }

        ParsedQuery {
            keywords,
            location: raw
                .location
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty()),
            salary_min: raw.salary_min.and_then(to_salary),
            salary_max: raw.salary_max.and_then(to_salary),
            job_type,
            remote: raw.remote.filter(|remote| *remote),
        }
    }
}

fn to_salary(amount: f64) -> Option<i32> {
    (amount.is_finite() && amount > 0.0 && amount <= i32::MAX as f64).then(|| amount.round() as i32)
}

/// Cache key for a query: case and whitespace differences share one entry.
fn cache_key(query: &str) -> String {
    let normalized = query.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    format!("{CACHE_KEY_PREFIX}{}", hex::encode(hasher.finalize()))
}

async fn cache_get(client: &redis::Client, key: &str) -> redis::RedisResult<Option<String>> {
    let mut conn = client.get_multiplexed_async_connection().await?;
    conn.get(key).await
}

async fn cache_set(client: &redis::Client, key: &str, value: String) -> redis::RedisResult<()> {
    let mut conn = client.get_multiplexed_async_connection().await?;
    conn.set_ex(key, value, CACHE_TTL_SECS).await
}

/// Semantic query parser via Claude, with a best-effort Redis cache in front.
pub struct LlmQueryParser {
    llm: LlmClient,
    cache: Option<redis::Client>,
}

impl LlmQueryParser {
    pub fn new(llm: LlmClient, cache: Option<redis::Client>) -> Self {
        Self { llm, cache }
    }

    async fn cached(&self, key: &str) -> Option<ParsedQuery> {
        let client = self.cache.as_ref()?;

        match cache_get(client, key).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).ok(),
            Ok(None) => None,
            Err(e) => {
                warn!("Query cache read failed: {e}");
                None
            }
        }
    }

    async fn store(&self, key: &str, parsed: &ParsedQuery) {
        let Some(client) = self.cache.as_ref() else {
            return;
        };
        let Ok(raw) = serde_json::to_string(parsed) else {
            return;
        };
        if let Err(e) = cache_set(client, key, raw).await {
            warn!("Query cache write failed: {e}");
        }
    }
}

#[async_trait]
impl QueryParser for LlmQueryParser {
    async fn parse(&self, query: &str) -> Result<ParsedQuery, AppError> {
        let key = cache_key(query);
        if let Some(parsed) = self.cached(&key).await {
            debug!("Query cache hit");
            return Ok(parsed);
        }

        let prompt = QUERY_PARSE_PROMPT_TEMPLATE.replace("{query}", query.trim());
        let raw = self
            .llm
            .call_json::<LlmParsedQuery>(&prompt, QUERY_PARSE_SYSTEM)
            .await
            .map_err(|e| AppError::Llm(format!("Query parsing failed: {e}")))?;

        let parsed = ParsedQuery::from(raw);
        self.store(&key, &parsed).await;
        Ok(parsed)
    }

    fn backend(&self) -> &'static str {
        "llm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::parse_json_reply;

    #[test]
    fn test_model_reply_is_normalized() {
        let reply = r#"{
            "keywords": ["Warehouse", "forklift", "warehouse", " "],
            "location": " Stockton ",
            "salaryMin": 41600,
            "salaryMax": null,
            "jobType": "Full Time",
            "remote": null
        }"#;
        let raw: LlmParsedQuery = parse_json_reply(reply).unwrap();
        let parsed = ParsedQuery::from(raw);

        assert_eq!(
            parsed.keywords,
            vec!["warehouse".to_string(), "forklift".to_string()]
        );
        assert_eq!(parsed.location.as_deref(), Some("Stockton"));
        assert_eq!(parsed.salary_min, Some(41_600));
        assert_eq!(parsed.salary_max, None);
        assert_eq!(parsed.job_type, Some(JobType::FullTime));
        assert_eq!(parsed.remote, None);
    }

    #[test]
    fn test_missing_fields_default_and_unknown_job_type_is_dropped() {
        let raw: LlmParsedQuery =
            parse_json_reply(r#"{"keywords": ["nurse"], "jobType": "gig", "remote": false}"#)
                .unwrap();
        let parsed = ParsedQuery::from(raw);
        assert_eq!(parsed.keywords, vec!["nurse".to_string()]);
        assert_eq!(parsed.job_type, None);
        assert_eq!(parsed.remote, None);
        assert_eq!(parsed.location, None);
    }

    #[test]
    fn test_nonsense_salaries_are_discarded() {
        assert_eq!(to_salary(-5.0), None);
        assert_eq!(to_salary(f64::NAN), None);
        assert_eq!(to_salary(1e12), None);
        assert_eq!(to_salary(52_000.4), Some(52_000));
    }

    #[test]
    fn test_cache_key_ignores_case_and_spacing() {
        assert_eq!(
            cache_key("Warehouse  jobs in Stockton"),
            cache_key(" warehouse jobs IN stockton ")
        );
        assert_ne!(cache_key("warehouse"), cache_key("warehouses"));
        assert!(cache_key("x").starts_with(CACHE_KEY_PREFIX));
    }

    #[tokio::test]
    async fn test_unconfigured_llm_fails_closed() {
        let parser = LlmQueryParser::new(LlmClient::new(String::new()).unwrap(), None);
        let result = parser.parse("remote nurse").await;
        assert!(matches!(result, Err(AppError::Llm(_))));
        assert_eq!(parser.backend(), "llm");
    }
}
