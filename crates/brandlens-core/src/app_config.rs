/// Deployment environment, from `BRANDLENS_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

/// Connection settings for the generative text service.
///
/// Injected into the call adapter at construction; nothing downstream reads
/// credentials from the environment.
#[derive(Clone)]
pub struct GenerativeConfig {
    pub api_key: String,
    pub project_id: Option<String>,
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for GenerativeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerativeConfig")
            .field("api_key", &"[redacted]")
            .field("project_id", &self.project_id)
            .field("base_url", &self.base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Models, deadlines and fan-out for one analysis run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisSettings {
    pub model: String,
    pub single_call_model: String,
    pub run_deadline_secs: u64,
    pub query_deadline_secs: u64,
    pub single_call_deadline_secs: u64,
    pub max_concurrent_queries: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4.1-mini".to_string(),
            single_call_model: "gpt-4o-mini".to_string(),
            run_deadline_secs: 600,
            query_deadline_secs: 300,
            single_call_deadline_secs: 120,
            max_concurrent_queries: 1,
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub generative: GenerativeConfig,
    pub analysis: AnalysisSettings,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("generative", &self.generative)
            .field("analysis", &self.analysis)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
