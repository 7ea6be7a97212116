mod applications;
mod auth;
mod config;
mod credits;
mod db;
mod errors;
mod jobs;
mod llm_client;
mod models;
mod regions;
mod routes;
mod search;
mod state;
mod sweeper;
#[cfg(test)]
mod test_support;
mod users;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::regions::cities_for_region;
use crate::routes::build_router;
use crate::search::llm_parser::LlmQueryParser;
use crate::search::query_parser::{HeuristicQueryParser, QueryParser};
use crate::state::AppState;
use crate::sweeper::spawn_sweeper;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing or malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting job board API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs migrations)
    let db = create_pool(&config.database_url).await?;

    // Query parser: heuristic unless ENABLE_LLM_QUERY_PARSING is set
    let query_parser: Arc<dyn QueryParser> = if config.enable_llm_query_parsing {
        let llm = LlmClient::new(config.anthropic_api_key.clone())?;
        let cache = match redis::Client::open(config.redis_url.clone()) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("Redis unavailable, query parse cache disabled: {e}");
                None
            }
        };
        info!("LLM query parsing enabled (model: {})", llm_client::MODEL);
        Arc::new(LlmQueryParser::new(llm, cache))
    } else {
        info!("Heuristic query parsing enabled");
        Arc::new(HeuristicQueryParser)
    };

    let allow_list = cities_for_region(&config.site_region);
    if allow_list.is_empty() {
        warn!(
            "SITE_REGION '{}' has no known cities; searches will not be regionally scoped",
            config.site_region
        );
    } else {
        info!(
            "Site region {} ({} cities)",
            config.site_region,
            allow_list.len()
        );
    }

    spawn_sweeper(db.clone(), config.sweep_interval_secs);

    // Build app state
    let state = AppState {
        db,
        config: config.clone(),
        query_parser,
        allow_list: Arc::new(allow_list),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
