//! Brand-visibility analysis pipeline.
//!
//! Generates intent-tiered search queries for a site, researches each one
//! through a web-search-enabled generative service, extracts the brands that
//! surface, scores how saturated the site's query space is, and asks for
//! concrete recommendations. Two execution strategies share the data model
//! and scoring engine: a multi-call workflow and a single strict-schema call.

pub mod brands;
pub mod error;
pub mod json_extract;
pub mod pipeline;
pub mod queries;
pub mod research;
pub mod responses;
pub mod retry;
pub mod scoring;
pub mod single_call;
pub mod store;
pub mod suggestions;
pub mod tokens;

pub use error::{AnalysisError, TransportError};
pub use json_extract::extract_json;
pub use pipeline::{Analyzer, Stage, Workflow};
pub use responses::{GenerateRequest, ResponsesClient, SearchContextSize, Tool, ToolChoice};
pub use retry::{retry_with_backoff, Backoff};
pub use scoring::{count_based_scores, rank_weighted_scores, visibility_score};
pub use store::{AnalysisStore, PgStore};
pub use tokens::{brand_tokens, detect_mention, registrable_domain, satisfies_category};
