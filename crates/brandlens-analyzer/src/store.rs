//! Persistence seam for the analysis workflow.

use std::future::Future;

use brandlens_core::{AnalysisRecord, NewAnalysisRecord, SiteRecord};
use brandlens_db::DbError;
use sqlx::PgPool;

/// Site lookup and analysis-record storage consumed by [`crate::Analyzer`].
pub trait AnalysisStore: Send + Sync {
    /// Find an owner's site by url.
    fn find_site(
        &self,
        owner_id: i64,
        url: &str,
    ) -> impl Future<Output = Result<Option<SiteRecord>, DbError>> + Send;

    /// Write one computed analysis. Called exactly once per successful run.
    fn create_analysis_record(
        &self,
        record: &NewAnalysisRecord,
    ) -> impl Future<Output = Result<AnalysisRecord, DbError>> + Send;

    /// An owner's records for a site, newest first.
    fn list_analysis_records(
        &self,
        owner_id: i64,
        site_id: i64,
    ) -> impl Future<Output = Result<Vec<AnalysisRecord>, DbError>> + Send;
}

/// [`AnalysisStore`] backed by the Postgres tables in `brandlens-db`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl AnalysisStore for PgStore {
    async fn find_site(&self, owner_id: i64, url: &str) -> Result<Option<SiteRecord>, DbError> {
        let row = brandlens_db::find_site_by_url(&self.pool, owner_id, url).await?;
        Ok(row.map(SiteRecord::from))
    }

    async fn create_analysis_record(
        &self,
        record: &NewAnalysisRecord,
    ) -> Result<AnalysisRecord, DbError> {
        brandlens_db::insert_analysis_record(&self.pool, record)
            .await?
            .into_record()
    }

    async fn list_analysis_records(
        &self,
        owner_id: i64,
        site_id: i64,
    ) -> Result<Vec<AnalysisRecord>, DbError> {
        brandlens_db::list_analysis_records(&self.pool, owner_id, site_id)
            .await?
            .into_iter()
            .map(brandlens_db::AnalysisRecordRow::into_record)
            .collect()
    }
}
