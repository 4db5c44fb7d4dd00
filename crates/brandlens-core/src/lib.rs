//! Shared domain types and configuration for brandlens.

pub mod app_config;
pub mod config;
pub mod types;

pub use app_config::{AnalysisSettings, AppConfig, Environment, GenerativeConfig};
pub use config::{load_app_config, load_app_config_from_env};
pub use types::{
    dedupe_trimmed, AnalysisRecord, AnalysisStrategy, BrandCitation, CategoryCounts,
    CategoryGroup, FinalAnalysis, GeneratedQuery, IntentCategory, MentionReason,
    NewAnalysisRecord, PerQueryResult, QueryBrandResult, QuerySet, RankedSearchHit, ResearchNote,
    ScoreSet, SingleCallReport, SiteProfile, SiteRecord,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid intent category: {0}")]
    InvalidCategory(String),

    #[error("invalid analysis strategy: {0}")]
    InvalidStrategy(String),
}
