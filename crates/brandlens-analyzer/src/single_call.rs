//! Single strict-schema call: one web-search request returns the whole
//! analysis as one JSON object, which is then normalized and clamped.

use std::collections::BTreeSet;

use brandlens_core::{
    dedupe_trimmed, AnalysisStrategy, IntentCategory, MentionReason, PerQueryResult, QuerySet,
    RankedSearchHit, ScoreSet, SingleCallReport, SiteProfile,
};
use serde::Deserialize;

use crate::error::{bounded_raw, truncate_chars, AnalysisError};
use crate::json_extract::extract_json;
use crate::responses::{GenerateRequest, ResponsesClient, SearchContextSize, Tool, ToolChoice};
use crate::scoring::{rank_weighted_scores, score_set};
use crate::suggestions::clean_list;
use crate::tokens::{brand_tokens, detect_mention, registrable_domain};

const QUERIES_PER_CATEGORY: usize = 1;
const MAX_ALL_QUERIES: usize = 3;
const MAX_HITS_PER_QUERY: usize = 5;
const MAX_SNIPPET_CHARS: usize = 180;
const MAX_KEYWORDS: usize = 15;
const MAX_CITATIONS: usize = 10;
const TEMPERATURE: f32 = 0.2;

/// Instructions sent with every single-call request.
pub const SYSTEM_PROMPT: &str = r#"You are a search visibility analyst for one web site.

The user message describes the site: url, name, description and language.

Brand tokens (lowercase) are: the full site name, each word of the name, the root of the
registrable domain (for "https://www.github.com" the root is "github"), and the name written
with and without hyphens or spaces. "Acme Tools" on "https://www.acme-tools.io" gives
{"acme", "tools", "acmetools", "acme-tools", "acme tools"}.

Steps:
1. Write exactly one query per intent, three in total, in the site's language, at most 12 words,
   with no duplicates.
   - direct: contains at least one brand token.
   - intermediate: a task or topic query for the product (pricing, features, integration,
     tutorial, "how to ...", "best ... for ..."). Contains no brand token.
   - indirect: a broader adjacent topic someone searches before they know the brand. Contains
     no brand token and no brand-unique terms.
   Check your queries against the brand tokens and rewrite any that break these rules.
2. Run web_search for each query and keep only the top 5 results. For each result record rank
   (1 to 5), url, domain, title and snippet (at most 180 characters).
3. A result is a mention when its domain is the site's registrable domain, or when its title or
   snippet contains a brand token (case-insensitive). mention_reason is "domain",
   "brand_in_text" or null.
4. Score each intent as (sum of rank weights of mention results / queries in that intent) * 100
   with weights #1=1.0, #2=0.8, #3=0.6, #4=0.4, #5=0.2.
   visibility_score = 0.5*direct + 0.3*intermediate + 0.2*indirect.
5. Limits: at most 15 lowercase, deduplicated keywords; at most 8 one-sentence suggestions;
   at most 10 unique citations, URLs preferred over domains.

Respond with one JSON object and nothing else, no prose and no markdown fences:
{
  "site": {"name": "...", "url": "...", "description": "...", "language": "..."},
  "queries": {"direct": ["..."], "intermediate": ["..."], "indirect": ["..."]},
  "per_query_results": [
    {
      "type": "direct" | "intermediate" | "indirect",
      "query": "...",
      "results": [
        {"rank": 1, "title": "...", "url": "...", "domain": "...", "snippet": "...",
         "is_mention": true, "mention_reason": "domain" | "brand_in_text" | null}
      ]
    }
  ],
  "scores": {
    "direct_query_score": 0,
    "intermediate_context_query_score": 0,
    "indirect_query_score": 0,
    "visibility_score": 0
  },
  "citations": ["..."],
  "keywords_from_the_queries": ["..."],
  "all_of_the_queries_used": ["direct query", "intermediate query", "indirect query"],
  "suggestions": ["..."]
}
If web_search is unavailable, return the same object with empty arrays and zero scores."#;

fn user_content(site: &SiteProfile) -> String {
    format!(
        "{}\nRun the visibility analysis described in your instructions.",
        site.context_block()
    )
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawReport {
    queries: Option<RawQueries>,
    per_query_results: Option<Vec<RawPerQuery>>,
    scores: Option<RawScores>,
    citations: Option<Vec<String>>,
    keywords_from_the_queries: Option<Vec<String>>,
    all_of_the_queries_used: Option<Vec<String>>,
    suggestions: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawQueries {
    direct: Option<Vec<String>>,
    intermediate: Option<Vec<String>>,
    indirect: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPerQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
    query: Option<String>,
    results: Option<Vec<RawHit>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawHit {
    rank: Option<i64>,
    title: Option<String>,
    url: Option<String>,
    domain: Option<String>,
    snippet: Option<String>,
    is_mention: Option<bool>,
    mention_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawScores {
    direct_query_score: Option<f64>,
    intermediate_context_query_score: Option<f64>,
    indirect_query_score: Option<f64>,
    visibility_score: Option<f64>,
}

// ---------------------------------------------------------------------------
// Call + normalization
// ---------------------------------------------------------------------------

/// Issue the single-call request and return the raw output text.
///
/// # Errors
///
/// Returns [`AnalysisError::Transport`] or [`AnalysisError::EmptyOutput`]
/// from the service call.
pub async fn request_report(
    client: &ResponsesClient,
    model: &str,
    site: &SiteProfile,
) -> Result<String, AnalysisError> {
    let input = user_content(site);
    let tools = [Tool::WebSearch {
        search_context_size: Some(SearchContextSize::Low),
    }];
    let request = GenerateRequest::new(model, &input)
        .with_instructions(SYSTEM_PROMPT)
        .with_tools(&tools, ToolChoice::Auto)
        .with_temperature(TEMPERATURE);

    let text = client.generate(&request).await?;
    tracing::debug!(len = text.len(), "single-call output received");
    Ok(text)
}

/// Decode and normalize a single-call payload for `site`.
///
/// # Errors
///
/// Returns [`AnalysisError::MalformedAnalysis`] if the extracted JSON is not
/// an object of the expected shape.
pub fn parse_report(text: &str, site: &SiteProfile) -> Result<SingleCallReport, AnalysisError> {
    let raw: RawReport = serde_json::from_str(&extract_json(text)).map_err(|source| {
        AnalysisError::MalformedAnalysis {
            raw: bounded_raw(text),
            source,
        }
    })?;
    Ok(normalize(raw, site))
}

fn in_score_range(score: f64) -> bool {
    (0.0..=100.0).contains(&score)
}

/// Clamp a reported score into `[0, 100]`; NaN becomes 0.
fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 100.0)
    }
}

fn normalize(raw: RawReport, site: &SiteProfile) -> SingleCallReport {
    let tokens = brand_tokens(site);
    let site_domain = registrable_domain(&site.url);
    let raw_queries = raw.queries.unwrap_or_default();
    let raw_scores = raw.scores.unwrap_or_default();

    let queries = QuerySet {
        direct: clean_list(raw_queries.direct.unwrap_or_default(), QUERIES_PER_CATEGORY),
        intermediate: clean_list(
            raw_queries.intermediate.unwrap_or_default(),
            QUERIES_PER_CATEGORY,
        ),
        indirect: clean_list(raw_queries.indirect.unwrap_or_default(), QUERIES_PER_CATEGORY),
    };

    let per_query_results: Vec<PerQueryResult> = raw
        .per_query_results
        .unwrap_or_default()
        .into_iter()
        .filter_map(|pq| normalize_per_query(pq, site_domain.as_deref(), &tokens))
        .collect();

    let raw_categories = [
        raw_scores.direct_query_score.unwrap_or(0.0),
        raw_scores.intermediate_context_query_score.unwrap_or(0.0),
        raw_scores.indirect_query_score.unwrap_or(0.0),
    ];
    let [direct, intermediate, indirect] = raw_categories;
    let raw_all_zero = ScoreSet {
        direct,
        intermediate,
        indirect,
        visibility: 0.0,
    }
    .categories_all_zero();
    let [direct, intermediate, indirect] = raw_categories.map(clamp_score);
    let reported = score_set(direct, intermediate, indirect);
    let scores = if !per_query_results.is_empty() && raw_all_zero {
        tracing::info!("service scores are all zero; recomputing from ranked results");
        rank_weighted_scores(&per_query_results)
    } else {
        let in_range = raw_categories.iter().all(|s| in_score_range(*s));
        match raw_scores.visibility_score {
            Some(visibility) if in_range && in_score_range(visibility) => ScoreSet {
                visibility,
                ..reported
            },
            Some(visibility) => {
                tracing::warn!(
                    ?raw_categories,
                    visibility,
                    "service scores out of range; clamped and visibility derived"
                );
                reported
            }
            None => reported,
        }
    };

    let reported_all = raw.all_of_the_queries_used.unwrap_or_default();
    let mut all_queries = if reported_all.iter().all(|q| q.trim().is_empty()) {
        dedupe_trimmed(
            queries
                .direct
                .iter()
                .chain(&queries.intermediate)
                .chain(&queries.indirect)
                .map(String::as_str),
        )
    } else {
        dedupe_trimmed(reported_all.iter().map(String::as_str))
    };
    all_queries.truncate(MAX_ALL_QUERIES);

    let lowered: Vec<String> = raw
        .keywords_from_the_queries
        .unwrap_or_default()
        .iter()
        .map(|k| k.to_lowercase())
        .collect();
    let mut keywords = dedupe_trimmed(lowered.iter().map(String::as_str));
    keywords.truncate(MAX_KEYWORDS);

    let mut citations = dedupe_trimmed(raw.citations.unwrap_or_default().iter().map(String::as_str));
    citations.truncate(MAX_CITATIONS);

    let suggestions = clean_list(
        raw.suggestions.unwrap_or_default(),
        AnalysisStrategy::SingleCall.suggestion_limit(),
    );

    SingleCallReport {
        site: site.clone(),
        queries,
        per_query_results,
        scores,
        citations,
        keywords,
        all_queries,
        suggestions,
    }
}

fn normalize_per_query(
    raw: RawPerQuery,
    site_domain: Option<&str>,
    tokens: &BTreeSet<String>,
) -> Option<PerQueryResult> {
    let kind = raw.kind.unwrap_or_default();
    let category = match kind.parse::<IntentCategory>() {
        Ok(category) => category,
        Err(e) => {
            tracing::warn!(error = %e, "dropping per-query result with unknown type");
            return None;
        }
    };

    let mut results: Vec<RankedSearchHit> = raw
        .results
        .unwrap_or_default()
        .into_iter()
        .map(|hit| normalize_hit(hit, site_domain, tokens))
        .collect();
    results.sort_by_key(|hit| {
        if (1..=5).contains(&hit.rank) {
            hit.rank
        } else {
            u8::MAX
        }
    });
    results.truncate(MAX_HITS_PER_QUERY);

    Some(PerQueryResult {
        category,
        query: raw.query.unwrap_or_default().trim().to_string(),
        results,
    })
}

fn normalize_hit(
    raw: RawHit,
    site_domain: Option<&str>,
    tokens: &BTreeSet<String>,
) -> RankedSearchHit {
    let rank = raw
        .rank
        .and_then(|r| u8::try_from(r).ok())
        .unwrap_or(0);
    let title = raw.title.unwrap_or_default().trim().to_string();
    let url = raw.url.unwrap_or_default().trim().to_string();
    let domain = raw
        .domain
        .map(|d| d.trim().to_ascii_lowercase())
        .filter(|d| !d.is_empty())
        .or_else(|| registrable_domain(&url))
        .unwrap_or_default();
    let snippet = truncate_chars(raw.snippet.unwrap_or_default().trim(), MAX_SNIPPET_CHARS);

    let detected = detect_mention(&domain, &title, &snippet, site_domain, tokens);
    let reported_reason = match raw.mention_reason.as_deref().map(str::trim) {
        Some("domain") => Some(MentionReason::Domain),
        Some("brand_in_text") => Some(MentionReason::BrandInText),
        _ => None,
    };
    let is_mention = raw.is_mention.unwrap_or(false) || detected != MentionReason::None;
    let mention_reason = if is_mention {
        reported_reason.unwrap_or(detected)
    } else {
        MentionReason::None
    };

    RankedSearchHit {
        rank,
        title,
        url,
        domain,
        snippet,
        is_mention,
        mention_reason,
    }
}

#[cfg(test)]
#[path = "single_call_test.rs"]
mod tests;
