//! Database operations for the `analysis_records` table.
//!
//! Records are written exactly once per successful analysis run and never
//! updated afterwards.

use brandlens_core::{AnalysisRecord, AnalysisStrategy, NewAnalysisRecord, ScoreSet};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `analysis_records` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnalysisRecordRow {
    pub id: i64,
    pub public_id: Uuid,
    pub site_id: i64,
    pub owner_id: i64,
    pub strategy: String,
    pub direct_score: Decimal,
    pub intermediate_score: Decimal,
    pub indirect_score: Decimal,
    pub visibility_score: Decimal,
    pub queries: Value,
    pub suggestions: Value,
    pub keywords: Value,
    pub citations: Value,
    pub analysis: Value,
    pub created_at: DateTime<Utc>,
}

impl AnalysisRecordRow {
    /// Convert the raw row into the domain record.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidStoredValue`] if the strategy tag or a JSONB
    /// string array column does not have the expected shape.
    pub fn into_record(self) -> Result<AnalysisRecord, DbError> {
        let strategy = self
            .strategy
            .parse::<AnalysisStrategy>()
            .map_err(|e| DbError::InvalidStoredValue {
                column: "strategy",
                reason: e.to_string(),
            })?;

        Ok(AnalysisRecord {
            id: self.id,
            public_id: self.public_id,
            site_id: self.site_id,
            owner_id: self.owner_id,
            strategy,
            scores: ScoreSet {
                direct: decimal_to_f64(self.direct_score),
                intermediate: decimal_to_f64(self.intermediate_score),
                indirect: decimal_to_f64(self.indirect_score),
                visibility: decimal_to_f64(self.visibility_score),
            },
            queries: string_array("queries", self.queries)?,
            suggestions: string_array("suggestions", self.suggestions)?,
            keywords: string_array("keywords", self.keywords)?,
            citations: string_array("citations", self.citations)?,
            analysis: self.analysis,
            created_at: self.created_at,
        })
    }
}

const RECORD_COLUMNS: &str = "id, public_id, site_id, owner_id, strategy, \
     direct_score, intermediate_score, indirect_score, visibility_score, \
     queries, suggestions, keywords, citations, analysis, created_at";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Insert a computed analysis and return the stored row.
///
/// Scores are rounded to three decimal places to fit `NUMERIC(7,3)`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_analysis_record(
    pool: &PgPool,
    record: &NewAnalysisRecord,
) -> Result<AnalysisRecordRow, DbError> {
    let public_id = Uuid::new_v4();
    let sql = format!(
        "INSERT INTO analysis_records \
             (public_id, site_id, owner_id, strategy, \
              direct_score, intermediate_score, indirect_score, visibility_score, \
              queries, suggestions, keywords, citations, analysis) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
         RETURNING {RECORD_COLUMNS}"
    );

    let row = sqlx::query_as::<_, AnalysisRecordRow>(&sql)
        .bind(public_id)
        .bind(record.site_id)
        .bind(record.owner_id)
        .bind(record.strategy.as_str())
        .bind(score_to_decimal(record.scores.direct))
        .bind(score_to_decimal(record.scores.intermediate))
        .bind(score_to_decimal(record.scores.indirect))
        .bind(score_to_decimal(record.scores.visibility))
        .bind(Value::from(record.queries.clone()))
        .bind(Value::from(record.suggestions.clone()))
        .bind(Value::from(record.keywords.clone()))
        .bind(Value::from(record.citations.clone()))
        .bind(&record.analysis)
        .fetch_one(pool)
        .await?;

    Ok(row)
}

/// List an owner's analysis records for one site, newest first.
///
/// Results are ordered by `created_at DESC` then `id DESC`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_analysis_records(
    pool: &PgPool,
    owner_id: i64,
    site_id: i64,
) -> Result<Vec<AnalysisRecordRow>, DbError> {
    let sql = format!(
        "SELECT {RECORD_COLUMNS} \
         FROM analysis_records \
         WHERE owner_id = $1 AND site_id = $2 \
         ORDER BY created_at DESC, id DESC"
    );

    let rows = sqlx::query_as::<_, AnalysisRecordRow>(&sql)
        .bind(owner_id)
        .bind(site_id)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Fetch one analysis record, scoped to its owner.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_analysis_record(
    pool: &PgPool,
    owner_id: i64,
    id: i64,
) -> Result<Option<AnalysisRecordRow>, DbError> {
    let sql = format!(
        "SELECT {RECORD_COLUMNS} \
         FROM analysis_records \
         WHERE id = $1 AND owner_id = $2"
    );

    let row = sqlx::query_as::<_, AnalysisRecordRow>(&sql)
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// Convert an `f64` score to a `Decimal` rounded to 3 dp. Non-finite values
/// store as zero.
#[must_use]
pub fn score_to_decimal(score: f64) -> Decimal {
    Decimal::from_f64(score).unwrap_or(Decimal::ZERO).round_dp(3)
}

fn decimal_to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

fn string_array(column: &'static str, value: Value) -> Result<Vec<String>, DbError> {
    match value {
        Value::Null => Ok(Vec::new()),
        other => serde_json::from_value(other).map_err(|e| DbError::InvalidStoredValue {
            column,
            reason: e.to_string(),
        }),
    }
}
