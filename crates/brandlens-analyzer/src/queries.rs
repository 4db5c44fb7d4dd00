//! Query generation per intent category.

use std::collections::BTreeSet;

use brandlens_core::{GeneratedQuery, IntentCategory, SiteProfile};

use crate::error::{bounded_raw, AnalysisError};
use crate::json_extract::extract_json;
use crate::responses::{GenerateRequest, ResponsesClient};
use crate::tokens::{brand_tokens, satisfies_category};

fn category_rule(category: IntentCategory) -> &'static str {
    match category {
        IntentCategory::Direct => {
            "Every query must contain the brand name, the domain, or another clear brand token."
        }
        IntentCategory::Intermediate => {
            "Queries describe the task, topic, or use case the product serves. Never use a brand token."
        }
        IntentCategory::Indirect => {
            "Queries capture broader, upstream intent a prospect has before they know the product \
             category exists. Never use a brand token."
        }
    }
}

fn query_prompt(
    site: &SiteProfile,
    category: IntentCategory,
    n: usize,
    tokens: &BTreeSet<String>,
) -> String {
    let tokens = tokens.iter().cloned().collect::<Vec<_>>().join(", ");
    format!(
        "You are a search query generator.\n\n\
         Category: {category}\n\
         Write exactly {n} distinct {category} search queries in the site's language ({language}).\n\n\
         Rules:\n\
         - {rule}\n\
         - Each query is 3 to 12 words.\n\
         - No duplicates.\n\
         - Brand tokens: {tokens}\n\
         - Respond with a JSON array of strings only, for example [\"query one\", \"query two\"].\n\
         - No commentary, markdown, or explanations.\n\n\
         {context}",
        language = site.language,
        rule = category_rule(category),
        context = site.context_block(),
    )
}

/// Generate up to `n` search queries for `category`.
///
/// `n <= 0` returns an empty list without calling the service. Extra queries
/// are truncated and blank ones dropped; a short list is accepted as is.
///
/// # Errors
///
/// - [`AnalysisError::Transport`] / [`AnalysisError::EmptyOutput`] from the
///   service call.
/// - [`AnalysisError::MalformedQueries`] if the output is not a JSON array of
///   strings.
pub async fn generate_queries(
    client: &ResponsesClient,
    model: &str,
    site: &SiteProfile,
    category: IntentCategory,
    n: i64,
) -> Result<Vec<GeneratedQuery>, AnalysisError> {
    let Ok(n) = usize::try_from(n) else {
        return Ok(Vec::new());
    };
    if n == 0 {
        return Ok(Vec::new());
    }

    let tokens = brand_tokens(site);
    let prompt = query_prompt(site, category, n, &tokens);
    let text = client.generate(&GenerateRequest::new(model, &prompt)).await?;

    let queries = parse_queries(&text, category, &site.language, n)?;
    for query in &queries {
        if !satisfies_category(&query.text, category, &tokens) {
            tracing::warn!(
                category = %category,
                query = %query.text,
                "generated query violates its category's brand-token rule"
            );
        }
    }

    tracing::info!(category = %category, requested = n, count = queries.len(), "generated queries");
    Ok(queries)
}

/// Decode a generated query list, dropping blanks and truncating to `n`.
///
/// # Errors
///
/// Returns [`AnalysisError::MalformedQueries`] if the extracted JSON is not an
/// array of strings.
pub fn parse_queries(
    text: &str,
    category: IntentCategory,
    language: &str,
    n: usize,
) -> Result<Vec<GeneratedQuery>, AnalysisError> {
    let raw: Vec<String> =
        serde_json::from_str(&extract_json(text)).map_err(|source| {
            AnalysisError::MalformedQueries {
                raw: bounded_raw(text),
                source,
            }
        })?;

    Ok(raw
        .into_iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .take(n)
        .map(|text| GeneratedQuery {
            text,
            category,
            language: language.to_string(),
        })
        .collect())
}
