//! Analysis command handlers: run, history, show.

use brandlens_analyzer::{
    retry_with_backoff, AnalysisError, Analyzer, PgStore, ResponsesClient, Workflow,
};
use brandlens_core::{AnalysisStrategy, AppConfig, CategoryCounts, IntentCategory, ScoreSet};
use clap::{Args, ValueEnum};

const RETRY_BACKOFF_BASE_MS: u64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// Query generation, per-query research, brand extraction
    Multi,
    /// One web-search call returning a ranked report
    Single,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Owner of the site
    #[arg(long)]
    pub owner: i64,

    /// Registered site url, matched exactly
    #[arg(long)]
    pub url: String,

    /// Workflow to run
    #[arg(long, value_enum, default_value_t = StrategyArg::Multi)]
    pub strategy: StrategyArg,

    /// Direct (brand-named) queries to generate; multi only
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub direct: i64,

    /// Intermediate (category) queries to generate; multi only
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub intermediate: i64,

    /// Indirect (problem-focused) queries to generate; multi only
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub indirect: i64,

    /// Extra attempts after a transient failure
    #[arg(long, default_value_t = 0)]
    pub retries: u32,
}

impl AnalyzeArgs {
    /// Query counts are floored to 1 before the run.
    pub(crate) fn workflow(&self) -> Workflow {
        match self.strategy {
            StrategyArg::Multi => Workflow::MultiCall(
                CategoryCounts {
                    direct: self.direct,
                    intermediate: self.intermediate,
                    indirect: self.indirect,
                }
                .normalized(),
            ),
            StrategyArg::Single => Workflow::SingleCall,
        }
    }
}

/// Visibility first, then one indented line per category.
pub(crate) fn score_lines(scores: &ScoreSet) -> Vec<String> {
    let mut lines = vec![format!("visibility:    {:.1}", scores.visibility)];
    lines.extend(IntentCategory::ALL.iter().map(|category| {
        let label = format!("{}:", category.as_str());
        format!("  {label:<14}{:.1}", scores.category(*category))
    }));
    lines
}

fn print_summary(
    strategy: AnalysisStrategy,
    scores: &ScoreSet,
    queries: &[String],
    suggestions: &[String],
) {
    println!("strategy:      {strategy}");
    for line in score_lines(scores) {
        println!("{line}");
    }

    println!("queries:");
    for query in queries {
        println!("  - {query}");
    }

    if suggestions.is_empty() {
        println!("suggestions:   none");
    } else {
        println!("suggestions:");
        for (i, suggestion) in suggestions.iter().enumerate() {
            println!("  {}. {suggestion}", i + 1);
        }
    }
}

/// Run one analysis and print its scores, queries and suggestions.
///
/// When the final write fails the computed analysis is printed before the
/// error is returned, so the work is not lost.
///
/// # Errors
///
/// Returns an error if the site is not registered, any stage fails after
/// `retries` extra attempts, or the result cannot be saved.
pub(crate) async fn run_analyze(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    args: &AnalyzeArgs,
) -> anyhow::Result<()> {
    let client = ResponsesClient::new(&config.generative)?;
    let analyzer = Analyzer::new(client, PgStore::new(pool.clone()), config.analysis.clone());
    let workflow = args.workflow();

    tracing::info!(
        owner_id = args.owner,
        url = %args.url,
        strategy = %workflow.strategy(),
        retries = args.retries,
        "starting analysis"
    );

    let result = retry_with_backoff(args.retries, RETRY_BACKOFF_BASE_MS, || {
        analyzer.run_analysis(args.owner, &args.url, &workflow)
    })
    .await;

    match result {
        Ok(record) => {
            println!("saved analysis {} ({})", record.id, record.public_id);
            print_summary(
                record.strategy,
                &record.scores,
                &record.queries,
                &record.suggestions,
            );
            Ok(())
        }
        Err(AnalysisError::Persistence { source, computed }) => {
            println!("analysis computed but not saved");
            print_summary(
                computed.strategy,
                &computed.scores,
                &computed.queries,
                &computed.suggestions,
            );
            println!("{}", serde_json::to_string_pretty(&computed.analysis)?);
            Err(AnalysisError::Persistence { source, computed }.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// List an owner's stored analyses for a site, newest first.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row cannot be decoded.
pub(crate) async fn run_history(
    pool: &sqlx::PgPool,
    owner: i64,
    site_id: i64,
) -> anyhow::Result<()> {
    if brandlens_db::get_site(pool, owner, site_id).await?.is_none() {
        anyhow::bail!("site {site_id} not found for owner {owner}");
    }
    let rows = brandlens_db::list_analysis_records(pool, owner, site_id).await?;

    if rows.is_empty() {
        println!("no analyses found for site {site_id}; run `analyze` first");
        return Ok(());
    }

    println!(
        "{:<8}{:<18}{:<14}{:<12}QUERIES",
        "ID", "CREATED", "STRATEGY", "VISIBILITY"
    );
    for row in rows {
        let record = row.into_record()?;
        let created = record.created_at.format("%Y-%m-%d %H:%M").to_string();
        println!(
            "{:<8}{:<18}{:<14}{:<12.1}{}",
            record.id,
            created,
            record.strategy,
            record.scores.visibility,
            record.queries.len()
        );
    }

    Ok(())
}

/// Print one stored analysis, including its full payload.
///
/// # Errors
///
/// Returns an error if the analysis does not exist for this owner or the
/// stored row cannot be decoded.
pub(crate) async fn run_show(pool: &sqlx::PgPool, owner: i64, id: i64) -> anyhow::Result<()> {
    let record = brandlens_db::get_analysis_record(pool, owner, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("analysis {id} not found for owner {owner}"))?
        .into_record()?;

    println!("analysis {} for site {}", record.id, record.site_id);
    print_summary(
        record.strategy,
        &record.scores,
        &record.queries,
        &record.suggestions,
    );
    if !record.keywords.is_empty() {
        println!("keywords:      {}", record.keywords.join(", "));
    }
    if !record.citations.is_empty() {
        println!("citations:");
        for citation in &record.citations {
            println!("  - {citation}");
        }
    }
    println!("{}", serde_json::to_string_pretty(&record.analysis)?);

    Ok(())
}
