//! Axum route handlers for the Search API.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::search::models::{
    JobFilters, JobType, ParsedQuery, SearchOptions, SortOrder, DEFAULT_PER_PAGE,
};
use crate::search::service::{search_jobs, SearchResults};
use crate::state::AppState;

const MAX_QUERY_LEN: usize = 500;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    /// Free-text query, run through the configured parser.
    pub q: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub remote: Option<bool>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    /// Comma-separated.
    pub categories: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub sort: Option<SortOrder>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub parsed_query: Option<ParsedQuery>,
    pub parser_backend: Option<&'static str>,
    pub filters: JobFilters,
    #[serde(flatten)]
    pub results: SearchResults,
}

#[derive(Debug, Deserialize)]
pub struct ParseQueryRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct ParseQueryResponse {
    pub parsed_query: ParsedQuery,
    pub parser_backend: &'static str,
}

fn validate_query_text(query: &str) -> Result<(), AppError> {
    if query.chars().count() > MAX_QUERY_LEN {
        return Err(AppError::Validation(format!(
            "query cannot exceed {MAX_QUERY_LEN} characters"
        )));
    }
    Ok(())
}

impl SearchParams {
    /// Filters given explicitly as query parameters (not derived from `q`).
    fn explicit_filters(&self) -> Result<JobFilters, AppError> {
        let job_type = match self.job_type.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(JobType::parse_label(raw).ok_or_else(|| {
                AppError::Validation(format!("Unknown job_type '{raw}'"))
            })?),
        };

        let categories = self
            .categories
            .as_deref()
            .map(|raw| raw.split(',').map(str::to_string).collect())
            .unwrap_or_default();

        Ok(JobFilters {
            keywords: Vec::new(),
            location: self.location.clone(),
            salary_min: self.salary_min,
            salary_max: self.salary_max,
            job_type,
            is_remote: self.remote,
            categories,
        }
        .normalized())
    }

    fn options(&self, has_keywords: bool) -> SearchOptions {
        let default_sort = if has_keywords {
            SortOrder::Relevance
        } else {
            SortOrder::Newest
        };
        SearchOptions {
            page: self.page.unwrap_or(1),
            per_page: self.per_page.unwrap_or(DEFAULT_PER_PAGE),
            sort: self.sort.unwrap_or(default_sort),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/jobs/search
///
/// Parses `q` (if given) into filters, overlays explicit parameters, and runs the search.
pub async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, AppError> {
    let explicit = params.explicit_filters()?;

    let query = params.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    let (parsed_query, parser_backend) = match query {
        Some(q) => {
            validate_query_text(q)?;
            let parsed = state.query_parser.parse(q).await?;
            (Some(parsed), Some(state.query_parser.backend()))
        }
        None => (None, None),
    };

    let filters = parsed_query
        .clone()
        .map(JobFilters::from)
        .unwrap_or_default()
        .merge_explicit(explicit)
        .normalized();

    let options = params.options(!filters.keywords.is_empty());
    let results = search_jobs(
        &state.db,
        &filters,
        options,
        Utc::now(),
        state.allow_list.as_slice(),
    )
    .await?;

    Ok(Json(SearchResponse {
        parsed_query,
        parser_backend,
        filters,
        results,
    }))
}

/// POST /api/v1/jobs/search/parse
///
/// Previews how a free-text query is interpreted, without searching.
pub async fn handle_parse_query(
    State(state): State<AppState>,
    Json(request): Json<ParseQueryRequest>,
) -> Result<Json<ParseQueryResponse>, AppError> {
    let query = request.query.trim();
    if query.is_empty() {
        return Err(AppError::Validation("query cannot be empty".to_string()));
    }
    validate_query_text(query)?;

    let parsed_query = state.query_parser.parse(query).await?;

    Ok(Json(ParseQueryResponse {
        parsed_query,
        parser_backend: state.query_parser.backend(),
    }))
}
