//! Shared fixtures: a mock generative service and an in-memory store.
#![allow(dead_code)]

use std::sync::Mutex;

use brandlens_analyzer::{AnalysisStore, Analyzer, ResponsesClient};
use brandlens_core::{
    AnalysisRecord, AnalysisSettings, GenerativeConfig, NewAnalysisRecord, SiteProfile,
    SiteRecord,
};
use brandlens_db::DbError;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockBuilder, MockServer, ResponseTemplate};

pub const OWNER_ID: i64 = 42;
pub const SITE_ID: i64 = 7;
pub const SITE_URL: &str = "https://www.acme-tools.io";

pub const QUERY_GENERATOR: &str = "You are a search query generator.";
pub const RESEARCHER: &str = "You are a research assistant with web search.";
pub const EXTRACTOR: &str = "You are given research notes";
pub const STRATEGIST: &str = "You are an SEO strategist";

pub fn site() -> SiteRecord {
    SiteRecord {
        id: SITE_ID,
        owner_id: OWNER_ID,
        profile: SiteProfile {
            name: "Acme Tools".to_string(),
            url: SITE_URL.to_string(),
            description: "Hand tools for makers".to_string(),
            language: "en".to_string(),
        },
        created_at: Utc::now(),
    }
}

pub fn generative_config(server: &MockServer) -> GenerativeConfig {
    GenerativeConfig {
        api_key: "test-key".to_string(),
        project_id: Some("proj_test".to_string()),
        base_url: format!("{}/v1", server.uri()),
        request_timeout_secs: 10,
    }
}

pub fn analyzer(server: &MockServer, store: MemoryStore, settings: AnalysisSettings) -> Analyzer<MemoryStore> {
    let client = ResponsesClient::new(&generative_config(server))
        .expect("client construction should not fail");
    Analyzer::new(client, store, settings)
}

/// A Responses API envelope whose message output is `text`.
pub fn text_response(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "resp_test",
        "object": "response",
        "status": "completed",
        "output": [
            {"type": "web_search_call", "id": "ws_1", "status": "completed"},
            {
                "type": "message",
                "id": "msg_1",
                "role": "assistant",
                "content": [{"type": "output_text", "text": text, "annotations": []}]
            }
        ]
    }))
}

/// POST /v1/responses whose body contains `needle`.
pub fn responses_call(needle: &str) -> MockBuilder {
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .and(body_string_contains(needle))
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryStore {
    sites: Vec<SiteRecord>,
    records: Mutex<Vec<AnalysisRecord>>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn with_site(site: SiteRecord) -> Self {
        Self {
            sites: vec![site],
            ..Self::default()
        }
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn records(&self) -> Vec<AnalysisRecord> {
        self.records.lock().expect("store lock").clone()
    }
}

impl AnalysisStore for MemoryStore {
    async fn find_site(&self, owner_id: i64, url: &str) -> Result<Option<SiteRecord>, DbError> {
        Ok(self
            .sites
            .iter()
            .find(|s| s.owner_id == owner_id && s.profile.url == url)
            .cloned())
    }

    async fn create_analysis_record(
        &self,
        record: &NewAnalysisRecord,
    ) -> Result<AnalysisRecord, DbError> {
        if self.fail_writes {
            return Err(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        let mut records = self.records.lock().expect("store lock");
        let stored = AnalysisRecord {
            id: i64::try_from(records.len()).expect("small store") + 1,
            public_id: Uuid::new_v4(),
            site_id: record.site_id,
            owner_id: record.owner_id,
            strategy: record.strategy,
            scores: record.scores,
            queries: record.queries.clone(),
            suggestions: record.suggestions.clone(),
            keywords: record.keywords.clone(),
            citations: record.citations.clone(),
            analysis: record.analysis.clone(),
            created_at: Utc::now(),
        };
        records.push(stored.clone());
        Ok(stored)
    }

    async fn list_analysis_records(
        &self,
        owner_id: i64,
        site_id: i64,
    ) -> Result<Vec<AnalysisRecord>, DbError> {
        let mut out: Vec<AnalysisRecord> = self
            .records
            .lock()
            .expect("store lock")
            .iter()
            .filter(|r| r.owner_id == owner_id && r.site_id == site_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(out)
    }
}
