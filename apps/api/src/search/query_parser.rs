//! Query Parser: pluggable, trait-based extraction of structured filters from free text.
//!
//! Default: `HeuristicQueryParser` (regex-based, deterministic, no network).
//! Alternative: `LlmQueryParser` in `llm_parser`.
//!
//! `AppState` holds an `Arc<dyn QueryParser>`, chosen at startup via config.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::errors::AppError;
use crate::regions::is_known_city;
use crate::search::models::{JobType, ParsedQuery};

/// Hourly amounts are annualized at 40 hours/week × 52 weeks.
pub const HOURS_PER_YEAR: f64 = 40.0 * 52.0;

/// Bare numbers below this are not read as salaries unless they carry a marker.
const BARE_SALARY_FLOOR: f64 = 10_000.0;

const MAX_LOCATION_WORDS: usize = 3;

const STOP_WORDS: &[&str] = &["jobs", "job", "positions", "openings"];

/// Words that end a location phrase.
const LOCATION_CONNECTIVES: &[&str] = &["with", "for", "that", "paying", "and", "or"];

static REMOTE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:remote|work\s+from\s+home|telecommute)\b").expect("Invalid remote regex")
});

static JOB_TYPE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(full[\s-]?time|part[\s-]?time|contract|internship|temporary|freelance)\b")
        .expect("Invalid job type regex")
});

/// Groups: 1 lead-in word, 2 `$`, 3 amount, 4 `k`, 5 range upper amount, 6 range `k`, 7 period.
static SALARY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)(?:\b(paying|pays|salary(?:\s+of)?|wages?\s+of|at\s+least|over|above|starting\s+at|minimum|min|under|below|up\s+to|less\s+than|max(?:imum)?)\s+)?",
        r"(\$)?\b(\d{1,3}(?:,\d{3})+|\d+(?:\.\d+)?)(?:\s*(k)\b)?",
        r"(?:\s*(?:-|to)\s*\$?(\d{1,3}(?:,\d{3})+|\d+(?:\.\d+)?)(?:\s*(k)\b)?)?",
        r"(\s*(?:/\s*(?:hour|hr)|per\s+(?:hour|hr)|an\s+hour|hourly|/\s*(?:year|yr)|per\s+year|a\s+year|annually|yearly)\b)?",
    ))
    .expect("Invalid salary regex")
});

static LOCATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:in|near|around)\s+([a-z][a-z.'\-]*(?:\s+[a-z][a-z.'\-]*)*)")
        .expect("Invalid location regex")
});

static WORD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+").expect("Invalid word regex"));

/// The query parser trait. Implement this to swap backends without touching
/// the search handler or service.
#[async_trait]
pub trait QueryParser: Send + Sync {
    async fn parse(&self, query: &str) -> Result<ParsedQuery, AppError>;

    /// Backend name reported alongside parse results.
    fn backend(&self) -> &'static str;
}

/// Pure-Rust regex parser. Fast, deterministic, no network call.
pub struct HeuristicQueryParser;

#[async_trait]
impl QueryParser for HeuristicQueryParser {
    async fn parse(&self, query: &str) -> Result<ParsedQuery, AppError> {
        Ok(parse_query(query))
    }

    fn backend(&self) -> &'static str {
        "heuristic"
    }
}

/// Extracts remote flag, job type, salary, location and keywords, in that order.
/// Each step removes the text it consumed before the next one runs.
pub fn parse_query(query: &str) -> ParsedQuery {
    let mut rest = query.to_string();
    let mut parsed = ParsedQuery::default();

    if REMOTE_REGEX.is_match(&rest) {
        parsed.remote = Some(true);
        rest = REMOTE_REGEX.replace_all(&rest, " ").into_owned();
    }

    if let Some(m) = JOB_TYPE_REGEX.find(&rest) {
        parsed.job_type = JobType::parse_label(m.as_str());
        rest = JOB_TYPE_REGEX.replace_all(&rest, " ").into_owned();
    }

    if let Some((range, salary)) = extract_salary(&rest) {
        parsed.salary_min = salary.min;
        parsed.salary_max = salary.max;
        rest.replace_range(range, " ");
    }

    if let Some((range, location)) = extract_location(&rest) {
        parsed.location = Some(location);
        rest.replace_range(range, " ");
    }

    parsed.keywords = extract_keywords(&rest);
    parsed
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SalaryBounds {
    min: Option<i32>,
    max: Option<i32>,
}

/// Finds the first salary-looking span. Bare numbers must carry a marker
/// (`$`, `k`, a pay period) or be large enough to be an annual figure.
fn extract_salary(text: &str) -> Option<(std::ops::Range<usize>, SalaryBounds)> {
    for caps in SALARY_REGEX.captures_iter(text) {
        let whole = caps.get(0)?;
        let lead = caps.get(1).map(|m| m.as_str().to_lowercase());
        let has_dollar = caps.get(2).is_some();
        let kilo = caps.get(4).is_some() || caps.get(6).is_some();
        let period = caps.get(7).map(|m| m.as_str().to_lowercase());
        let hourly = period
            .as_deref()
            .map(|p| p.contains("hour") || p.contains("hr"))
            .unwrap_or(false);

        // "401k" is a retirement plan.
        let is_401k = kilo && caps.get(3).is_some_and(|m| m.as_str() == "401");
        if is_401k && !has_dollar && caps.get(5).is_none() {
            continue;
        }

        let Some(first) = caps.get(3).and_then(|m| annualize(m.as_str(), kilo, hourly)) else {
            continue;
        };
        let second = caps.get(5).and_then(|m| annualize(m.as_str(), kilo, hourly));

        let marked = has_dollar || kilo || period.is_some();
        if !marked && (first as f64) < BARE_SALARY_FLOOR {
            continue;
        }

        let is_ceiling = lead
            .as_deref()
            .map(|l| {
                l.starts_with("under")
                    || l.starts_with("below")
                    || l.starts_with("up")
                    || l.starts_with("less")
                    || l.starts_with("max")
            })
            .unwrap_or(false);

        let bounds = match second {
            Some(second) => SalaryBounds {
                min: Some(first.min(second)),
                max: Some(first.max(second)),
            },
            None if is_ceiling => SalaryBounds {
                min: None,
                max: Some(first),
            },
            None => SalaryBounds {
                min: Some(first),
                max: None,
            },
        };

        return Some((whole.range(), bounds));
    }
    None
}

fn annualize(raw: &str, kilo: bool, hourly: bool) -> Option<i32> {
    let mut amount: f64 = raw.replace(',', "").parse().ok()?;
    if kilo {
        amount *= 1000.0;
    }
    if hourly {
        amount *= HOURS_PER_YEAR;
    }
    let amount = amount.round();
    (amount > 0.0 && amount <= i32::MAX as f64).then_some(amount as i32)
}

/// Reads the place after "in/near/around". Up to three candidate words are gathered,
/// stopping at a connective or a state name. The longest leading run naming a known city
/// wins; otherwise one word is kept (two when both are capitalised). Words past the place
/// stay in the text for the keyword pass.
fn extract_location(text: &str) -> Option<(std::ops::Range<usize>, String)> {
    let caps = LOCATION_REGEX.captures(text)?;
    let whole = caps.get(0)?;
    let place = caps.get(1)?;

    // (word, end offset in `text`)
    let mut words: Vec<(&str, usize)> = Vec::new();
    let mut state_end = None;

    for m in WORD_REGEX.find_iter(place.as_str()) {
        let lower = m.as_str().to_lowercase();
        let end = place.start() + m.end();
        if LOCATION_CONNECTIVES.contains(&lower.as_str()) {
            break;
        }
        if words.is_empty() && lower == "the" {
            continue;
        }
        if !words.is_empty() && (lower == "ca" || lower == "california") {
            state_end = Some(end);
            break;
        }
        if words.len() == MAX_LOCATION_WORDS {
            break;
        }
        words.push((m.as_str(), end));
    }

    if words.is_empty() {
        return None;
    }

    let kept = known_city_len(&words).unwrap_or_else(|| unknown_place_len(&words));
    let end = match state_end {
        Some(state_end) if kept == words.len() => state_end,
        _ => words[kept - 1].1,
    };

    Some((whole.start()..end, join_words(&words[..kept])))
}

fn join_words(words: &[(&str, usize)]) -> String {
    words.iter().map(|(word, _)| *word).collect::<Vec<_>>().join(" ")
}

fn known_city_len(words: &[(&str, usize)]) -> Option<usize> {
    (1..=words.len())
        .rev()
        .find(|&n| is_known_city(&join_words(&words[..n])))
}

fn unknown_place_len(words: &[(&str, usize)]) -> usize {
    let capitalized = |word: &str| word.chars().next().is_some_and(char::is_uppercase);
    match words {
        [(first, _), (second, _), ..] if capitalized(first) && capitalized(second) => 2,
        _ => 1,
    }
}

/// Lowercases, trims punctuation, drops short tokens, stop words and duplicates.
fn extract_keywords(text: &str) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();

    for token in text.split_whitespace() {
        let token = token
            .trim_matches(|c: char| !c.is_alphanumeric() && c != '+' && c != '#')
            .to_lowercase();

        if token.chars().count() <= 2 || STOP_WORDS.contains(&token.as_str()) {
            continue;
        }
        if !keywords.contains(&token) {
            keywords.push(token);
        }
    }

    keywords
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_type_is_extracted_and_removed_from_keywords() {
        let parsed = parse_query("full-time warehouse jobs in Stockton");
        assert_eq!(parsed.job_type, Some(JobType::FullTime));
        assert_eq!(parsed.job_type.unwrap().to_string(), "full-time");
        assert_eq!(parsed.location.as_deref(), Some("Stockton"));
        assert_eq!(parsed.keywords, vec!["warehouse".to_string()]);
    }

    #[test]
    fn test_job_type_hyphenation_is_normalized() {
        assert_eq!(parse_query("part time cashier").job_type, Some(JobType::PartTime));
        assert_eq!(parse_query("PartTime cashier").job_type, Some(JobType::PartTime));
        assert_eq!(parse_query("freelance designer").job_type, Some(JobType::Freelance));
        let parsed = parse_query("Full Time nurse");
        assert_eq!(parsed.job_type, Some(JobType::FullTime));
        assert_eq!(parsed.keywords, vec!["nurse".to_string()]);
    }

    #[test]
    fn test_hourly_salary_is_annualized() {
        let parsed = parse_query("forklift 20/hour");
        assert_eq!(parsed.salary_min, Some(20 * 40 * 52));
        assert_eq!(parsed.salary_min, Some(41_600));
        assert_eq!(parsed.keywords, vec!["forklift".to_string()]);
    }

    #[test]
    fn test_salary_with_k_suffix_and_lead_in() {
        let parsed = parse_query("accountant paying $65k");
        assert_eq!(parsed.salary_min, Some(65_000));
        assert_eq!(parsed.salary_max, None);
        assert_eq!(parsed.keywords, vec!["accountant".to_string()]);
    }

    #[test]
    fn test_salary_range() {
        let parsed = parse_query("engineer $90k-120k");
        assert_eq!(parsed.salary_min, Some(90_000));
        assert_eq!(parsed.salary_max, Some(120_000));

        let parsed = parse_query("caregiver $18 to $22 per hour");
        assert_eq!(parsed.salary_min, Some(18 * 2080));
        assert_eq!(parsed.salary_max, Some(22 * 2080));
    }

    #[test]
    fn test_salary_ceiling() {
        let parsed = parse_query("receptionist under $40,000");
        assert_eq!(parsed.salary_min, None);
        assert_eq!(parsed.salary_max, Some(40_000));
    }

    #[test]
    fn test_small_bare_numbers_are_not_salaries() {
        let parsed = parse_query("driver 5 years experience");
        assert_eq!(parsed.salary_min, None);
        assert_eq!(parsed.salary_max, None);

        let parsed = parse_query("graduate program 2023");
        assert_eq!(parsed.salary_min, None);
    }

    #[test]
    fn test_large_bare_number_is_a_salary() {
        let parsed = parse_query("analyst 55000");
        assert_eq!(parsed.salary_min, Some(55_000));
    }

    #[test]
    fn test_remote_detection_strips_phrase() {
        let parsed = parse_query("Remote customer service");
        assert_eq!(parsed.remote, Some(true));
        assert_eq!(
            parsed.keywords,
            vec!["customer".to_string(), "service".to_string()]
        );

        let parsed = parse_query("data entry work from home");
        assert_eq!(parsed.remote, Some(true));
        assert_eq!(parsed.keywords, vec!["data".to_string(), "entry".to_string()]);

        assert_eq!(parse_query("telecommute writer").remote, Some(true));
        assert_eq!(parse_query("welder").remote, None);
    }

    #[test]
    fn test_location_stops_at_connective() {
        let parsed = parse_query("mechanic near Modesto with benefits");
        assert_eq!(parsed.location.as_deref(), Some("Modesto"));
        assert_eq!(
            parsed.keywords,
            vec!["mechanic".to_string(), "with".to_string(), "benefits".to_string()]
        );
    }

    #[test]
    fn test_words_after_a_known_city_stay_keywords() {
        let parsed = parse_query("warehouse in Stockton forklift");
        assert_eq!(parsed.location.as_deref(), Some("Stockton"));
        assert_eq!(
            parsed.keywords,
            vec!["warehouse".to_string(), "forklift".to_string()]
        );

        let parsed = parse_query("cook in sonora breakfast shift");
        assert_eq!(parsed.location.as_deref(), Some("sonora"));
        assert_eq!(
            parsed.keywords,
            vec!["cook".to_string(), "breakfast".to_string(), "shift".to_string()]
        );
    }

    #[test]
    fn test_unknown_place_keeps_one_or_two_capitalised_words() {
        let parsed = parse_query("welder in Boise Idaho shop");
        assert_eq!(parsed.location.as_deref(), Some("Boise Idaho"));
        assert_eq!(parsed.keywords, vec!["welder".to_string(), "shop".to_string()]);

        let parsed = parse_query("cashier near smalltown grocery");
        assert_eq!(parsed.location.as_deref(), Some("smalltown"));
        assert_eq!(
            parsed.keywords,
            vec!["cashier".to_string(), "grocery".to_string()]
        );
    }

    #[test]
    fn test_retirement_plan_is_not_a_salary() {
        let parsed = parse_query("jobs with 401k benefits");
        assert_eq!(parsed.salary_min, None);
        assert_eq!(parsed.salary_max, None);

        let parsed = parse_query("accountant 401k $70k");
        assert_eq!(parsed.salary_min, Some(70_000));
    }

    #[test]
    fn test_multi_word_location_and_state_suffix() {
        let parsed = parse_query("librarian jobs around Los Banos CA");
        assert_eq!(parsed.location.as_deref(), Some("Los Banos"));
        assert_eq!(parsed.keywords, vec!["librarian".to_string()]);

        let parsed = parse_query("nurse in Elk Grove, CA");
        assert_eq!(parsed.location.as_deref(), Some("Elk Grove"));
    }

    #[test]
    fn test_stop_words_and_short_tokens_are_dropped() {
        let parsed = parse_query("IT jobs positions openings job QA tester");
        assert_eq!(parsed.keywords, vec!["tester".to_string()]);
    }

    #[test]
    fn test_keywords_are_deduplicated_and_trimmed() {
        let parsed = parse_query("Welder, welder! (welder) c++");
        assert_eq!(parsed.keywords, vec!["welder".to_string(), "c++".to_string()]);
    }

    #[test]
    fn test_everything_at_once() {
        let parsed = parse_query("remote part-time bookkeeper $25/hr in Tracy");
        assert_eq!(parsed.remote, Some(true));
        assert_eq!(parsed.job_type, Some(JobType::PartTime));
        assert_eq!(parsed.salary_min, Some(25 * 2080));
        assert_eq!(parsed.location.as_deref(), Some("Tracy"));
        assert_eq!(parsed.keywords, vec!["bookkeeper".to_string()]);
    }

    #[test]
    fn test_empty_query() {
        assert_eq!(parse_query("   "), ParsedQuery::default());
    }

    #[tokio::test]
    async fn test_heuristic_parser_trait_impl() {
        let parser = HeuristicQueryParser;
        let parsed = parser.parse("contract electrician").await.unwrap();
        assert_eq!(parsed.job_type, Some(JobType::Contract));
        assert_eq!(parser.backend(), "heuristic");
    }
}
