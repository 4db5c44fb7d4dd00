//! Web-search-backed research for a single query.

use brandlens_core::{ResearchNote, SiteProfile};

use crate::error::AnalysisError;
use crate::responses::{GenerateRequest, ResponsesClient, Tool, ToolChoice};

fn research_prompt(query: &str, site: &SiteProfile) -> String {
    format!(
        "You are a research assistant with web search.\n\n\
         Search the web for this query: \"{query}\"\n\n\
         Report which brands and services show up for it. For each one list:\n\
         - the brand name\n\
         - its URL when you can find it\n\
         - the domains or pages where it was mentioned\n\n\
         Write plain prose or bullet points in English or {language}. Do not answer in JSON.",
        language = site.language,
    )
}

/// Research one query with the web-search tool and return free-text notes.
///
/// # Errors
///
/// Returns [`AnalysisError::Transport`] or [`AnalysisError::EmptyOutput`]
/// from the service call.
pub async fn research_query(
    client: &ResponsesClient,
    model: &str,
    query: &str,
    site: &SiteProfile,
) -> Result<ResearchNote, AnalysisError> {
    let prompt = research_prompt(query, site);
    let tools = [Tool::web_search()];
    let request = GenerateRequest::new(model, &prompt).with_tools(&tools, ToolChoice::Auto);

    let text = client.generate(&request).await?;
    tracing::debug!(query, len = text.len(), "research notes collected");

    Ok(ResearchNote {
        query: query.to_string(),
        text,
    })
}
