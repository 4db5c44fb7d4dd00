//! Structured brand extraction from research notes.

use brandlens_core::{BrandCitation, ResearchNote};
use serde::Deserialize;

use crate::error::{bounded_raw, AnalysisError};
use crate::json_extract::{extract_json, leading_array};
use crate::responses::{GenerateRequest, ResponsesClient};

fn extraction_prompt(note: &ResearchNote) -> String {
    format!(
        "You are given research notes summarizing web search results for the query \"{query}\".\n\n\
         List every brand that appears. For each brand give:\n\
         - name: the brand name\n\
         - url: the brand's main URL, or an empty string when unknown\n\
         - citations: domains or full URLs where the brand was mentioned\n\n\
         Respond with this JSON object only, no markdown:\n\
         {{\"brands\": [{{\"name\": \"...\", \"url\": \"...\", \"citations\": [\"...\"]}}]}}\n\n\
         Use [] for citations when none are known. Return {{\"brands\": []}} when there are no brands.\n\n\
         Research notes:\n\
         ---\n\
         {notes}\n",
        query = note.query,
        notes = note.text,
    )
}

/// `brands` must be present; an explicit `null` means none were found.
#[derive(Debug, Deserialize)]
struct BrandsPayload {
    brands: serde_json::Value,
}

impl BrandsPayload {
    fn into_raw(self) -> Result<Vec<RawBrand>, serde_json::Error> {
        if self.brands.is_null() {
            return Ok(Vec::new());
        }
        serde_json::from_value(self.brands)
    }
}

#[derive(Debug, Deserialize)]
struct RawBrand {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    citations: Option<Vec<Option<String>>>,
}

impl RawBrand {
    fn normalize(self) -> Option<BrandCitation> {
        let name = self.name?.trim().to_string();
        if name.is_empty() {
            return None;
        }
        let url = self
            .url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        let citations = self
            .citations
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        Some(BrandCitation {
            name,
            url,
            citations,
        })
    }
}

/// Extract the brands mentioned in one query's research notes.
///
/// # Errors
///
/// - [`AnalysisError::Transport`] / [`AnalysisError::EmptyOutput`] from the
///   service call.
/// - [`AnalysisError::MalformedBrands`] if the output does not decode.
pub async fn extract_brands(
    client: &ResponsesClient,
    model: &str,
    note: &ResearchNote,
) -> Result<Vec<BrandCitation>, AnalysisError> {
    let prompt = extraction_prompt(note);
    let text = client.generate(&GenerateRequest::new(model, &prompt)).await?;
    let brands = parse_brands(&text)?;
    tracing::debug!(query = %note.query, count = brands.len(), "brands extracted");
    Ok(brands)
}

/// Decode a `{"brands": [...]}` payload, or a bare array of brands, into
/// normalized citations.
///
/// Null or missing citation lists become empty, blank names are dropped and
/// an empty url becomes `None`. `"brands": null` means no brands.
///
/// # Errors
///
/// Returns [`AnalysisError::MalformedBrands`] if the extracted JSON does not
/// match either shape, including an object without a `brands` key.
pub fn parse_brands(text: &str) -> Result<Vec<BrandCitation>, AnalysisError> {
    let decoded = match leading_array(text) {
        Some(array) => serde_json::from_str::<Vec<RawBrand>>(array),
        None => serde_json::from_str::<BrandsPayload>(&extract_json(text))
            .and_then(BrandsPayload::into_raw),
    };
    let raw = decoded.map_err(|source| AnalysisError::MalformedBrands {
        raw: bounded_raw(text),
        source,
    })?;

    Ok(raw.into_iter().filter_map(RawBrand::normalize).collect())
}
