//! HTTP adapter for an OpenAI Responses-compatible generative service.
//!
//! One [`ResponsesClient::generate`] call issues exactly one request and
//! returns the trimmed output text. Retrying is left to callers; see
//! [`crate::retry`].

use std::time::Duration;

use brandlens_core::GenerativeConfig;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::error::{truncate_chars, AnalysisError, TransportError};

const LOG_SNIPPET_CHARS: usize = 120;
const ERROR_BODY_CHARS: usize = 500;

/// Tools the service may invoke while answering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Tool {
    WebSearch {
        #[serde(skip_serializing_if = "Option::is_none")]
        search_context_size: Option<SearchContextSize>,
    },
}

impl Tool {
    /// Web search with the service's default context size.
    #[must_use]
    pub fn web_search() -> Self {
        Tool::WebSearch {
            search_context_size: None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Tool::WebSearch { .. } => "web_search",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchContextSize {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    Auto,
    Required,
    None,
}

/// One generation request. Borrowed so prompts are not copied per call.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<&'a str>,
    #[serde(skip_serializing_if = "<[Tool]>::is_empty")]
    pub tools: &'a [Tool],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl<'a> GenerateRequest<'a> {
    #[must_use]
    pub fn new(model: &'a str, input: &'a str) -> Self {
        Self {
            model,
            input,
            instructions: None,
            tools: &[],
            tool_choice: None,
            temperature: None,
        }
    }

    #[must_use]
    pub fn with_instructions(mut self, instructions: &'a str) -> Self {
        self.instructions = Some(instructions);
        self
    }

    #[must_use]
    pub fn with_tools(mut self, tools: &'a [Tool], choice: ToolChoice) -> Self {
        self.tools = tools;
        self.tool_choice = Some(choice);
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ResponsesEnvelope {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Option<Vec<ContentPart>>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl ResponsesEnvelope {
    /// Concatenate every `output_text` part of every `message` item, in order.
    fn output_text(&self) -> String {
        self.output
            .iter()
            .filter(|item| item.kind == "message")
            .filter_map(|item| item.content.as_deref())
            .flatten()
            .filter(|part| part.kind == "output_text")
            .filter_map(|part| part.text.as_deref())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for the generative service's `/responses` endpoint.
///
/// Credentials, project id, base url and timeout all come from the injected
/// [`GenerativeConfig`].
#[derive(Debug, Clone)]
pub struct ResponsesClient {
    client: Client,
    api_key: String,
    project_id: Option<String>,
    endpoint: Url,
}

impl ResponsesClient {
    /// Build a client from connection settings.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`TransportError::InvalidBaseUrl`] if the configured base url
    /// does not parse.
    pub fn new(config: &GenerativeConfig) -> Result<Self, TransportError> {
        Self::with_base_url(config, &config.base_url)
    }

    /// Build a client pointed at an explicit base url (for testing with
    /// wiremock).
    ///
    /// # Errors
    ///
    /// Same as [`ResponsesClient::new`].
    pub fn with_base_url(config: &GenerativeConfig, base_url: &str) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("brandlens/0.1 (visibility-analysis)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&normalised)
            .and_then(|base| base.join("responses"))
            .map_err(|e| TransportError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            project_id: config.project_id.clone(),
            endpoint,
        })
    }

    /// Issue one generation request and return the trimmed output text.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::Transport`] on network failure, non-2xx status, or
    ///   an undecodable envelope.
    /// - [`AnalysisError::EmptyOutput`] if the concatenated text is blank.
    pub async fn generate(&self, request: &GenerateRequest<'_>) -> Result<String, AnalysisError> {
        let tools: Vec<&str> = request.tools.iter().map(|t| t.name()).collect();
        tracing::debug!(
            model = request.model,
            tools = ?tools,
            prompt = %truncate_chars(request.input, LOG_SNIPPET_CHARS),
            "generative request"
        );

        let mut builder = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(request);
        if let Some(project) = &self.project_id {
            builder = builder.header("OpenAI-Project", project);
        }

        let response = builder.send().await.map_err(TransportError::from)?;
        let status = response.status();
        let body = response.text().await.map_err(TransportError::from)?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: truncate_chars(&body, ERROR_BODY_CHARS),
            }
            .into());
        }

        let envelope: ResponsesEnvelope =
            serde_json::from_str(&body).map_err(TransportError::Envelope)?;
        let text = envelope.output_text();
        let text = text.trim();

        if text.is_empty() {
            tracing::warn!(model = request.model, "generative service returned no output text");
            return Err(AnalysisError::EmptyOutput);
        }

        tracing::debug!(
            model = request.model,
            len = text.len(),
            output = %truncate_chars(text, LOG_SNIPPET_CHARS),
            "generative response"
        );
        Ok(text.to_string())
    }
}
