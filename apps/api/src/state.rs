use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::search::query_parser::QueryParser;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Pluggable query parser. Heuristic by default; LLM-backed with ENABLE_LLM_QUERY_PARSING.
    pub query_parser: Arc<dyn QueryParser>,
    /// City substrings of the site region; scopes every non-remote search.
    pub allow_list: Arc<Vec<&'static str>>,
}
