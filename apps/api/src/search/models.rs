use serde::{Deserialize, Serialize};

pub use crate::models::job::JobType;

/// Structured filters extracted from free text. Ephemeral; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub keywords: Vec<String>,
    pub location: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    /// Serialized in label form, e.g. `full-time`.
    #[serde(default, with = "job_type_label")]
    pub job_type: Option<JobType>,
    pub remote: Option<bool>,
}

mod job_type_label {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use super::JobType;

    pub fn serialize<S: Serializer>(value: &Option<JobType>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(job_type) => s.serialize_some(job_type.label()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<JobType>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|raw| {
                JobType::parse_label(&raw)
                    .ok_or_else(|| D::Error::custom(format!("unknown job type '{raw}'")))
            })
            .transpose()
    }
}

/// Search filters. Every field is optional; absent fields add no predicate
/// (the regional allow-list is site policy, not a filter field).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobFilters {
    pub keywords: Vec<String>,
    pub location: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub job_type: Option<JobType>,
    pub is_remote: Option<bool>,
    pub categories: Vec<String>,
}

impl From<ParsedQuery> for JobFilters {
    fn from(parsed: ParsedQuery) -> Self {
        JobFilters {
            keywords: parsed.keywords,
            location: parsed.location,
            salary_min: parsed.salary_min,
            salary_max: parsed.salary_max,
            job_type: parsed.job_type,
            is_remote: parsed.remote,
            categories: Vec::new(),
        }
    }
}

impl JobFilters {
    /// Overlays explicitly supplied values on top of `self`, field by field.
    pub fn merge_explicit(mut self, explicit: JobFilters) -> JobFilters {
        if !explicit.keywords.is_empty() {
            self.keywords = explicit.keywords;
        }
        if explicit.location.is_some() {
            self.location = explicit.location;
        }
        if explicit.salary_min.is_some() {
            self.salary_min = explicit.salary_min;
        }
        if explicit.salary_max.is_some() {
            self.salary_max = explicit.salary_max;
        }
        if explicit.job_type.is_some() {
            self.job_type = explicit.job_type;
        }
        if explicit.is_remote.is_some() {
            self.is_remote = explicit.is_remote;
        }
        if !explicit.categories.is_empty() {
            self.categories = explicit.categories;
        }
        self
    }

    /// Trims text fields and drops empty ones so they count as absent.
    pub fn normalized(mut self) -> JobFilters {
        self.keywords = clean_list(self.keywords);
        self.categories = clean_list(self.categories);
        self.location = self
            .location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());
        self
    }
}

fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Relevance,
    Newest,
    Salary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub page: u32,
    pub per_page: u32,
    pub sort: SortOrder,
}

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            sort: SortOrder::Relevance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsed_query_converts_remote_flag() {
        let parsed = ParsedQuery {
            keywords: vec!["nurse".to_string()],
            remote: Some(true),
            job_type: Some(JobType::PartTime),
            ..Default::default()
        };
        let filters = JobFilters::from(parsed);
        assert_eq!(filters.is_remote, Some(true));
        assert_eq!(filters.job_type, Some(JobType::PartTime));
        assert_eq!(filters.keywords, vec!["nurse".to_string()]);
        assert!(filters.categories.is_empty());
    }

    #[test]
    fn test_parsed_job_type_uses_hyphenated_label() {
        let parsed = ParsedQuery {
            job_type: Some(JobType::FullTime),
            ..Default::default()
        };
        let json = serde_json::to_value(&parsed).unwrap();
        assert_eq!(json["job_type"], "full-time");

        let cached: ParsedQuery =
            serde_json::from_str(r#"{"keywords":[],"job_type":"part-time"}"#).unwrap();
        assert_eq!(cached.job_type, Some(JobType::PartTime));
        assert_eq!(cached.location, None);
    }

    #[test]
    fn test_explicit_values_override_parsed_ones() {
        let parsed = JobFilters {
            keywords: vec!["driver".to_string()],
            location: Some("Stockton".to_string()),
            salary_min: Some(40_000),
            ..Default::default()
        };
        let explicit = JobFilters {
            location: Some("Modesto".to_string()),
            is_remote: Some(false),
            ..Default::default()
        };
        let merged = parsed.merge_explicit(explicit);
        assert_eq!(merged.keywords, vec!["driver".to_string()]);
        assert_eq!(merged.location.as_deref(), Some("Modesto"));
        assert_eq!(merged.salary_min, Some(40_000));
        assert_eq!(merged.is_remote, Some(false));
    }

    #[test]
    fn test_blank_strings_count_as_absent() {
        let filters = JobFilters {
            keywords: vec!["  ".to_string(), " welder ".to_string()],
            location: Some("   ".to_string()),
            categories: vec![String::new()],
            ..Default::default()
        }
        .normalized();
        assert_eq!(filters.keywords, vec!["welder".to_string()]);
        assert_eq!(filters.location, None);
        assert!(filters.categories.is_empty());
    }
}
