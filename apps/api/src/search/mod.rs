// Job search: free-text parsing, filter → predicate construction, ranked paginated lookup.
// LLM parsing goes through llm_client; nothing here calls the Anthropic API directly.

pub mod filter_builder;
pub mod handlers;
pub mod llm_parser;
pub mod models;
pub mod prompts;
pub mod query_parser;
pub mod service;
