use std::env::VarError;
use std::fmt::Display;
use std::str::FromStr;

use crate::app_config::{AnalysisSettings, AppConfig, Environment, GenerativeConfig};
use crate::ConfigError;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Load configuration from the process environment after reading `.env`.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load configuration from the process environment only; `.env` is not read.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Typed reads over an env lookup. Blank values count as unset.
struct Vars<F> {
    lookup: F,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    fn get(&self, var: &str) -> Option<String> {
        (self.lookup)(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, var: &str) -> Result<String, ConfigError> {
        self.get(var)
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    }

    fn text(&self, var: &str, default: &str) -> String {
        self.get(var).unwrap_or_else(|| default.to_string())
    }

    fn parse<T>(&self, var: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.get(var) {
            None => Ok(default),
            Some(raw) => raw.parse::<T>().map_err(|e| invalid(var, e)),
        }
    }

    /// Like [`Vars::parse`], rejecting zero.
    fn positive<T>(&self, var: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr + PartialEq + Default,
        T::Err: Display,
    {
        let value = self.parse(var, default)?;
        if value == T::default() {
            return Err(invalid(var, "must be at least 1"));
        }
        Ok(value)
    }
}

fn invalid(var: &str, reason: impl Display) -> ConfigError {
    ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: reason.to_string(),
    }
}

/// Build configuration from an env-var lookup, so tests can pass a map.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let vars = Vars { lookup };

    let database_url = vars.required("DATABASE_URL")?;
    let api_key = vars.required("OPENAI_API_KEY")?;

    let env = vars.parse("BRANDLENS_ENV", Environment::Development)?;
    let log_level = vars.text("BRANDLENS_LOG_LEVEL", "info");

    let generative = GenerativeConfig {
        api_key,
        project_id: vars.get("OPENAI_PROJECT_ID"),
        base_url: vars
            .text("BRANDLENS_OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL)
            .trim_end_matches('/')
            .to_string(),
        request_timeout_secs: vars.positive("BRANDLENS_REQUEST_TIMEOUT_SECS", 300)?,
    };

    let defaults = AnalysisSettings::default();
    let analysis = AnalysisSettings {
        model: vars.text("BRANDLENS_MODEL", &defaults.model),
        single_call_model: vars.text("BRANDLENS_SINGLE_CALL_MODEL", &defaults.single_call_model),
        run_deadline_secs: vars.positive("BRANDLENS_RUN_DEADLINE_SECS", defaults.run_deadline_secs)?,
        query_deadline_secs: vars
            .positive("BRANDLENS_QUERY_DEADLINE_SECS", defaults.query_deadline_secs)?,
        single_call_deadline_secs: vars.positive(
            "BRANDLENS_SINGLE_CALL_DEADLINE_SECS",
            defaults.single_call_deadline_secs,
        )?,
        max_concurrent_queries: vars.positive(
            "BRANDLENS_MAX_CONCURRENT_QUERIES",
            defaults.max_concurrent_queries,
        )?,
    };

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        generative,
        analysis,
        db_max_connections: vars.positive("BRANDLENS_DB_MAX_CONNECTIONS", 10)?,
        db_min_connections: vars.parse("BRANDLENS_DB_MIN_CONNECTIONS", 1)?,
        db_acquire_timeout_secs: vars.positive("BRANDLENS_DB_ACQUIRE_TIMEOUT_SECS", 10)?,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
