//! Offline tests for brandlens-db pool configuration and row conversions.
//! These tests do not require a live database connection.

use brandlens_core::{
    AnalysisSettings, AppConfig, Environment, GenerativeConfig, SiteRecord,
};
use brandlens_db::{AnalysisRecordRow, PoolConfig, SiteRow};

fn app_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        log_level: "info".to_string(),
        generative: GenerativeConfig {
            api_key: "sk-test".to_string(),
            project_id: None,
            base_url: "http://localhost".to_string(),
            request_timeout_secs: 30,
        },
        analysis: AnalysisSettings::default(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&app_config());
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn pool_min_connections_never_exceed_max() {
    let mut config = app_config();
    config.db_max_connections = 2;
    config.db_min_connections = 5;
    let pool_config = PoolConfig::from_app_config(&config);
    assert_eq!(pool_config.min_connections, 2);
}

#[test]
fn site_row_converts_into_site_record() {
    use chrono::Utc;

    let row = SiteRow {
        id: 5,
        owner_id: 11,
        name: "Acme Tools".to_string(),
        url: "https://www.acme-tools.io".to_string(),
        description: "Hand tools for makers".to_string(),
        language: "en".to_string(),
        created_at: Utc::now(),
    };

    let record = SiteRecord::from(row);
    assert_eq!(record.id, 5);
    assert_eq!(record.owner_id, 11);
    assert_eq!(record.profile.name, "Acme Tools");
    assert_eq!(record.profile.url, "https://www.acme-tools.io");
    assert_eq!(record.profile.language, "en");
}

/// Compile-time smoke test: confirm that [`AnalysisRecordRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn analysis_record_row_has_expected_fields() {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    let row = AnalysisRecordRow {
        id: 1_i64,
        public_id: Uuid::new_v4(),
        site_id: 2_i64,
        owner_id: 3_i64,
        strategy: "single_call".to_string(),
        direct_score: Decimal::new(100, 0),
        intermediate_score: Decimal::ZERO,
        indirect_score: Decimal::ZERO,
        visibility_score: Decimal::new(50, 0),
        queries: serde_json::json!(["acme tools review", "best hand planes", "woodworking for beginners"]),
        suggestions: serde_json::json!([]),
        keywords: serde_json::json!(["hand planes"]),
        citations: serde_json::json!(["https://acme-tools.io"]),
        analysis: serde_json::json!({}),
        created_at: Utc::now(),
    };

    let record = row.into_record().expect("row should convert");
    assert_eq!(record.queries.len(), 3);
    assert_eq!(record.keywords, vec!["hand planes"]);
    assert!((record.scores.visibility - 50.0).abs() < 1e-9);
}
