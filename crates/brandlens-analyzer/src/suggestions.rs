//! Recommendation generation over a completed analysis.

use brandlens_core::{FinalAnalysis, SiteProfile};
use serde::Deserialize;

use crate::error::{bounded_raw, AnalysisError};
use crate::json_extract::extract_json;
use crate::responses::{GenerateRequest, ResponsesClient};

fn suggestions_prompt(site: &SiteProfile, analysis_json: &str, limit: usize) -> String {
    format!(
        "You are an SEO strategist reviewing a competitive brand analysis.\n\n\
         {context}\n\
         The analysis below groups search queries by intent: direct (brand-aware), \
         intermediate (task or use case) and indirect (upstream intent). Each query lists the \
         competing brands that surfaced, their URLs, and the pages or domains citing them.\n\n\
         Compare the site with those competitors: where they are cited, how often they appear \
         across queries and intents, and what content, landing pages, tools or comparison pages \
         they have that the site lacks.\n\n\
         Respond with this JSON object only, no markdown:\n\
         {{\"suggestions\": [\"One short, concrete suggestion.\"]}}\n\n\
         Rules:\n\
         - At most {limit} suggestions.\n\
         - Each is one or two sentences, practical and specific to this site.\n\
         - Do not mention the JSON or its structure.\n\n\
         Analysis:\n\
         ---\n\
         {analysis_json}\n",
        context = site.context_block(),
    )
}

#[derive(Debug, Deserialize)]
struct SuggestionsPayload {
    #[serde(default)]
    suggestions: Option<Vec<Option<String>>>,
}

/// Ask for concrete recommendations based on a finished multi-call analysis.
///
/// # Errors
///
/// - [`AnalysisError::Payload`] if the analysis cannot be serialized.
/// - [`AnalysisError::Transport`] / [`AnalysisError::EmptyOutput`] from the
///   service call.
/// - [`AnalysisError::MalformedSuggestions`] if the output does not decode.
pub async fn generate_suggestions(
    client: &ResponsesClient,
    model: &str,
    site: &SiteProfile,
    analysis: &FinalAnalysis,
    limit: usize,
) -> Result<Vec<String>, AnalysisError> {
    let analysis_json = serde_json::to_string(analysis).map_err(AnalysisError::Payload)?;
    let prompt = suggestions_prompt(site, &analysis_json, limit);
    let text = client.generate(&GenerateRequest::new(model, &prompt)).await?;
    let suggestions = parse_suggestions(&text, limit)?;
    tracing::info!(count = suggestions.len(), "suggestions generated");
    Ok(suggestions)
}

/// Decode `{"suggestions": [...]}`, trimming, dropping blanks, and capping at
/// `limit`.
///
/// # Errors
///
/// Returns [`AnalysisError::MalformedSuggestions`] if the extracted JSON does
/// not match the expected shape.
pub fn parse_suggestions(text: &str, limit: usize) -> Result<Vec<String>, AnalysisError> {
    let payload: SuggestionsPayload =
        serde_json::from_str(&extract_json(text)).map_err(|source| {
            AnalysisError::MalformedSuggestions {
                raw: bounded_raw(text),
                source,
            }
        })?;

    Ok(clean_list(
        payload.suggestions.unwrap_or_default().into_iter().flatten(),
        limit,
    ))
}

/// Trim, drop blanks, and keep the first `limit` entries.
pub(crate) fn clean_list<I>(items: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_caps_and_trims() {
        let text = r#"{"suggestions": [" Add a pricing comparison page. ", "", null, "Publish tutorials.", "Third."]}"#;
        let suggestions = parse_suggestions(text, 2).unwrap();
        assert_eq!(
            suggestions,
            vec!["Add a pricing comparison page.", "Publish tutorials."]
        );
    }

    #[test]
    fn parse_missing_key_is_empty() {
        assert!(parse_suggestions("{}", 10).unwrap().is_empty());
    }

    #[test]
    fn parse_rejects_prose() {
        let err = parse_suggestions("You should write more blog posts.", 10).unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedSuggestions { .. }));
    }

    #[test]
    fn prompt_includes_limit_and_analysis() {
        let site = SiteProfile {
            name: "Acme".into(),
            url: "https://acme.io".into(),
            description: "Tools".into(),
            language: "en".into(),
        };
        let prompt = suggestions_prompt(&site, r#"{"direct":{"queries":[]}}"#, 8);
        assert!(prompt.contains("At most 8 suggestions"));
        assert!(prompt.contains(r#"{"direct":{"queries":[]}}"#));
        assert!(prompt.contains("- Name: Acme"));
    }
}
