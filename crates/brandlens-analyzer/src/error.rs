//! Error types for the analysis pipeline and its generative transport.

use brandlens_core::NewAnalysisRecord;
use brandlens_db::DbError;
use thiserror::Error;

/// Upper bound on raw generated text embedded in decode errors.
pub const MAX_RAW_TEXT_CHARS: usize = 2_000;

/// Failures talking to the generative service itself.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network, TLS, or timeout failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("generative service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response envelope could not be decoded.
    #[error("undecodable response envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    /// The configured base url cannot be joined with the endpoint path.
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl TransportError {
    /// Timeouts, connection failures, 5xx and 429 are worth another attempt.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            TransportError::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status()
                        .is_some_and(|s| s.is_server_error() || s.as_u16() == 429)
            }
            TransportError::Status { status, .. } => *status == 429 || (500..600).contains(status),
            TransportError::Envelope(_) | TransportError::InvalidBaseUrl { .. } => false,
        }
    }
}

/// Errors produced by an analysis run.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("generative service returned empty output")]
    EmptyOutput,

    #[error("failed to parse queries JSON: {source} (raw={raw})")]
    MalformedQueries {
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse brands JSON: {source} (raw={raw})")]
    MalformedBrands {
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse suggestions JSON: {source} (raw={raw})")]
    MalformedSuggestions {
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse analysis JSON: {source} (raw={raw})")]
    MalformedAnalysis {
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("site not found for owner {owner_id}: {url}")]
    NotFound { owner_id: i64, url: String },

    #[error("{stage} exceeded its {secs}s deadline")]
    DeadlineExceeded { stage: &'static str, secs: u64 },

    #[error("site lookup failed: {0}")]
    Store(#[source] DbError),

    #[error("failed to serialize analysis payload: {0}")]
    Payload(#[source] serde_json::Error),

    /// The analysis was fully computed but could not be saved. The computed
    /// record is carried so callers can still surface it.
    #[error("failed to save analysis: {source}")]
    Persistence {
        #[source]
        source: DbError,
        computed: Box<NewAnalysisRecord>,
    },
}

impl AnalysisError {
    /// Whether re-running the failed operation has a reasonable chance of
    /// succeeding.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            AnalysisError::Transport(e) => e.is_retriable(),
            AnalysisError::EmptyOutput | AnalysisError::DeadlineExceeded { .. } => true,
            AnalysisError::MalformedQueries { .. }
            | AnalysisError::MalformedBrands { .. }
            | AnalysisError::MalformedSuggestions { .. }
            | AnalysisError::MalformedAnalysis { .. }
            | AnalysisError::NotFound { .. }
            | AnalysisError::Store(_)
            | AnalysisError::Payload(_)
            | AnalysisError::Persistence { .. } => false,
        }
    }
}

/// Truncate generated text for embedding in an error, on a char boundary.
#[must_use]
pub fn bounded_raw(text: &str) -> String {
    truncate_chars(text, MAX_RAW_TEXT_CHARS)
}

pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
