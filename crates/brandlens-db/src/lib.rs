//! Postgres persistence for sites and analysis records.

use std::collections::HashSet;
use std::time::Duration;

use brandlens_core::AppConfig;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

pub mod analysis_records;
pub mod sites;

pub use analysis_records::{
    get_analysis_record, insert_analysis_record, list_analysis_records, AnalysisRecordRow,
};
pub use sites::{find_site_by_url, get_site, insert_site, SiteRow};

// Resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

/// Tables an analysis run reads or writes.
pub const REQUIRED_TABLES: [&str; 2] = ["sites", "analysis_records"];

/// Pool sizing, taken from [`AppConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections.min(config.db_max_connections),
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("record not found")]
    NotFound,
    #[error("invalid stored value in {column}: {reason}")]
    InvalidStoredValue { column: &'static str, reason: String },
    #[error("table {0} is missing; run `brandlens db migrate`")]
    MissingTable(&'static str),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Open a pool against `database_url`.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if no connection can be established within the
/// acquire timeout.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Versions already recorded as applied. Empty on a fresh database, where
/// the bookkeeping table does not exist yet.
async fn applied_versions(pool: &PgPool) -> HashSet<i64> {
    sqlx::query_scalar::<_, i64>("SELECT version FROM _sqlx_migrations WHERE success = true")
        .fetch_all(pool)
        .await
        .map(|versions| versions.into_iter().collect())
        .unwrap_or_default()
}

/// Apply pending migrations and return how many were pending.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if a migration fails or an applied
/// migration no longer matches its file.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, sqlx::migrate::MigrateError> {
    let applied = applied_versions(pool).await;
    let pending = MIGRATOR
        .iter()
        .filter(|m| m.migration_type.is_up_migration() && !applied.contains(&m.version))
        .count();

    MIGRATOR.run(pool).await?;
    Ok(pending)
}

/// Round-trip a trivial query.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await?;
    Ok(())
}

/// Ping the database and confirm the analysis tables exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the database is unreachable, or
/// [`DbError::MissingTable`] for the first table migrations have not created.
pub async fn health_check(pool: &PgPool) -> Result<(), DbError> {
    ping(pool).await?;
    for table in REQUIRED_TABLES {
        let exists: bool = sqlx::query_scalar("SELECT to_regclass($1) IS NOT NULL")
            .bind(format!("public.{table}"))
            .fetch_one(pool)
            .await?;
        if !exists {
            return Err(DbError::MissingTable(table));
        }
    }
    Ok(())
}
