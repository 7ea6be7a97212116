// Prompt constants for LLM-backed query parsing.

/// System prompt for query parsing: enforces JSON-only output.
pub const QUERY_PARSE_SYSTEM: &str = "You are a job search assistant for a regional job board \
    in California's Central Valley. Convert a job seeker's free-text search into structured \
    search filters. You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Query parsing prompt template. Replace `{query}` before sending.
pub const QUERY_PARSE_PROMPT_TEMPLATE: &str = r#"Extract search filters from this job search query:

"{query}"

Return a JSON object with this EXACT schema (no extra fields):
{
  "keywords": ["warehouse", "forklift"],
  "location": "Stockton",
  "salaryMin": 41600,
  "salaryMax": null,
  "jobType": "full-time",
  "remote": null
}

Rules:
- keywords: the skills, titles or industries the person is looking for. Lowercase. Omit filler words such as "jobs", "positions", "openings".
- location: a city or area name only, or null.
- salaryMin / salaryMax: annual US dollars as integers, or null. Convert hourly pay with 40 hours × 52 weeks.
- jobType: one of "full-time", "part-time", "contract", "internship", "temporary", "freelance", or null.
- remote: true only if the person asks for remote or work-from-home roles, otherwise null.
"#;
