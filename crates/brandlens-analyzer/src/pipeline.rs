//! Analysis orchestration.
//!
//! [`Analyzer::run_analysis`] resolves the site, computes the analysis with
//! the chosen [`Workflow`] under its deadline, and writes exactly one record.
//! Any failure before the write aborts the run with nothing persisted.

use std::future::Future;
use std::time::Duration;

use brandlens_core::{
    AnalysisRecord, AnalysisSettings, AnalysisStrategy, CategoryCounts, FinalAnalysis,
    GeneratedQuery, IntentCategory, NewAnalysisRecord, QueryBrandResult, SiteProfile, SiteRecord,
};
use futures::{stream, StreamExt, TryStreamExt};

use crate::brands::extract_brands;
use crate::error::AnalysisError;
use crate::queries::generate_queries;
use crate::research::research_query;
use crate::responses::ResponsesClient;
use crate::scoring::count_based_scores;
use crate::single_call::{parse_report, request_report};
use crate::store::AnalysisStore;
use crate::suggestions::generate_suggestions;

/// Distinct citation references kept on a multi-call record.
const MAX_MULTI_CALL_CITATIONS: usize = 10;

/// Which execution strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workflow {
    /// Query generation, per-query research and extraction, count-based
    /// scoring, then suggestions. Counts are used as given.
    MultiCall(CategoryCounts),
    /// One strict-schema web-search call with rank-weighted scoring.
    SingleCall,
}

impl Workflow {
    #[must_use]
    pub fn strategy(&self) -> AnalysisStrategy {
        match self {
            Workflow::MultiCall(_) => AnalysisStrategy::MultiCall,
            Workflow::SingleCall => AnalysisStrategy::SingleCall,
        }
    }
}

/// Workflow states, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    GeneratingQueries,
    ResearchingPerQuery,
    ExtractingBrands,
    Scoring,
    GeneratingSuggestions,
    Requesting,
    Parsing,
    Persisting,
    Done,
}

impl Stage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::GeneratingQueries => "generating_queries",
            Stage::ResearchingPerQuery => "researching_per_query",
            Stage::ExtractingBrands => "extracting_brands",
            Stage::Scoring => "scoring",
            Stage::GeneratingSuggestions => "generating_suggestions",
            Stage::Requesting => "requesting",
            Stage::Parsing => "parsing",
            Stage::Persisting => "persisting",
            Stage::Done => "done",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn enter(stage: Stage, site: &SiteRecord) {
    tracing::info!(stage = %stage, site_id = site.id, url = %site.profile.url, "analysis stage");
}

async fn with_deadline<T, F>(stage: &'static str, secs: u64, work: F) -> Result<T, AnalysisError>
where
    F: Future<Output = Result<T, AnalysisError>>,
{
    tokio::time::timeout(Duration::from_secs(secs), work)
        .await
        .map_err(|_| AnalysisError::DeadlineExceeded { stage, secs })?
}

/// Runs analyses against a generative service and an [`AnalysisStore`].
pub struct Analyzer<S> {
    client: ResponsesClient,
    store: S,
    settings: AnalysisSettings,
}

impl<S: AnalysisStore> Analyzer<S> {
    #[must_use]
    pub fn new(client: ResponsesClient, store: S, settings: AnalysisSettings) -> Self {
        Self {
            client,
            store,
            settings,
        }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Analyze the owner's site registered under `site_url` and persist the
    /// result.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::Store`] / [`AnalysisError::NotFound`] if the site
    ///   lookup fails or finds nothing.
    /// - Any stage error from [`Analyzer::compute`].
    /// - [`AnalysisError::Persistence`], carrying the computed record, if the
    ///   final write fails.
    pub async fn run_analysis(
        &self,
        owner_id: i64,
        site_url: &str,
        workflow: &Workflow,
    ) -> Result<AnalysisRecord, AnalysisError> {
        let site = self
            .store
            .find_site(owner_id, site_url)
            .await
            .map_err(AnalysisError::Store)?
            .ok_or_else(|| AnalysisError::NotFound {
                owner_id,
                url: site_url.to_string(),
            })?;

        self.run_for_site(&site, workflow).await
    }

    /// Analyze an already-resolved site and persist the result.
    ///
    /// # Errors
    ///
    /// Same as [`Analyzer::run_analysis`], minus the lookup errors.
    pub async fn run_for_site(
        &self,
        site: &SiteRecord,
        workflow: &Workflow,
    ) -> Result<AnalysisRecord, AnalysisError> {
        let computed = self.compute(site, workflow).await?;

        enter(Stage::Persisting, site);
        match self.store.create_analysis_record(&computed).await {
            Ok(record) => {
                tracing::info!(
                    stage = %Stage::Done,
                    record_id = record.id,
                    strategy = %record.strategy,
                    visibility = record.scores.visibility,
                    "analysis saved"
                );
                Ok(record)
            }
            Err(source) => {
                tracing::error!(site_id = site.id, error = %source, "analysis save failed");
                Err(AnalysisError::Persistence {
                    source,
                    computed: Box::new(computed),
                })
            }
        }
    }

    /// Compute an analysis without persisting it, bounded by the workflow's
    /// deadline.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure, or
    /// [`AnalysisError::DeadlineExceeded`] when a deadline elapses.
    pub async fn compute(
        &self,
        site: &SiteRecord,
        workflow: &Workflow,
    ) -> Result<NewAnalysisRecord, AnalysisError> {
        match workflow {
            Workflow::MultiCall(counts) => {
                with_deadline(
                    "analysis run",
                    self.settings.run_deadline_secs,
                    self.compute_multi_call(site, *counts),
                )
                .await
            }
            Workflow::SingleCall => {
                with_deadline(
                    "single-call analysis",
                    self.settings.single_call_deadline_secs,
                    self.compute_single_call(site),
                )
                .await
            }
        }
    }

    /// An owner's stored analyses for a site, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Store`] if the read fails.
    pub async fn history(
        &self,
        owner_id: i64,
        site_id: i64,
    ) -> Result<Vec<AnalysisRecord>, AnalysisError> {
        self.store
            .list_analysis_records(owner_id, site_id)
            .await
            .map_err(AnalysisError::Store)
    }

    async fn compute_multi_call(
        &self,
        site: &SiteRecord,
        counts: CategoryCounts,
    ) -> Result<NewAnalysisRecord, AnalysisError> {
        let profile = &site.profile;
        let model = self.settings.model.as_str();

        enter(Stage::GeneratingQueries, site);
        let mut generated = Vec::with_capacity(IntentCategory::ALL.len());
        for category in IntentCategory::ALL {
            let queries =
                generate_queries(&self.client, model, profile, category, counts.get(category))
                    .await?;
            generated.push((category, queries));
        }

        enter(Stage::ResearchingPerQuery, site);
        let mut analysis = FinalAnalysis::default();
        for (category, queries) in &generated {
            analysis.group_mut(*category).queries =
                self.collect_category(profile, *category, queries).await?;
        }

        enter(Stage::Scoring, site);
        let scores = count_based_scores(&analysis, &counts);
        tracing::info!(
            direct = scores.direct,
            intermediate = scores.intermediate,
            indirect = scores.indirect,
            visibility = scores.visibility,
            "scores computed"
        );

        enter(Stage::GeneratingSuggestions, site);
        let suggestions = generate_suggestions(
            &self.client,
            model,
            profile,
            &analysis,
            AnalysisStrategy::MultiCall.suggestion_limit(),
        )
        .await?;

        let payload = serde_json::to_value(&analysis).map_err(AnalysisError::Payload)?;
        Ok(NewAnalysisRecord {
            site_id: site.id,
            owner_id: site.owner_id,
            strategy: AnalysisStrategy::MultiCall,
            scores,
            queries: analysis.all_queries(),
            suggestions,
            keywords: Vec::new(),
            citations: analysis.citations(MAX_MULTI_CALL_CITATIONS),
            analysis: payload,
        })
    }

    /// Research and extract every query of one category, in order. The first
    /// failure aborts the batch.
    async fn collect_category(
        &self,
        site: &SiteProfile,
        category: IntentCategory,
        queries: &[GeneratedQuery],
    ) -> Result<Vec<QueryBrandResult>, AnalysisError> {
        let limit = self.settings.max_concurrent_queries.max(1);
        tracing::debug!(category = %category, count = queries.len(), limit, "processing category");

        stream::iter(
            queries
                .iter()
                .map(|q| self.process_query(site, category, &q.text)),
        )
        .buffered(limit)
        .try_collect()
        .await
    }

    async fn process_query(
        &self,
        site: &SiteProfile,
        category: IntentCategory,
        query: &str,
    ) -> Result<QueryBrandResult, AnalysisError> {
        let model = self.settings.model.as_str();
        let work = async {
            let note = research_query(&self.client, model, query, site).await?;
            tracing::debug!(stage = %Stage::ExtractingBrands, category = %category, query, "extracting brands");
            let brands = extract_brands(&self.client, model, &note).await?;
            Ok(QueryBrandResult {
                query: query.to_string(),
                brands,
            })
        };

        with_deadline("query", self.settings.query_deadline_secs, work)
            .await
            .inspect_err(|e| {
                tracing::error!(category = %category, query, error = %e, "query processing failed");
            })
    }

    async fn compute_single_call(&self, site: &SiteRecord) -> Result<NewAnalysisRecord, AnalysisError> {
        enter(Stage::Requesting, site);
        let text =
            request_report(&self.client, &self.settings.single_call_model, &site.profile).await?;

        enter(Stage::Parsing, site);
        let report = parse_report(&text, &site.profile)?;
        let payload = serde_json::to_value(&report).map_err(AnalysisError::Payload)?;

        Ok(NewAnalysisRecord {
            site_id: site.id,
            owner_id: site.owner_id,
            strategy: AnalysisStrategy::SingleCall,
            scores: report.scores,
            queries: report.all_queries,
            suggestions: report.suggestions,
            keywords: report.keywords,
            citations: report.citations,
            analysis: payload,
        })
    }
}
