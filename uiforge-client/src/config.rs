use crate::history::DEFAULT_HISTORY_LIMIT;
use std::path::PathBuf;
use std::time::Duration;
use uiforge_dsl::{IdStrategy, IngestPolicy, ValidateOptions};

/// Default Generation Service endpoint. Overridable via env for custom deployments.
pub const DEFAULT_GENERATION_URL: &str = "http://127.0.0.1:8787/api";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_HISTORY_DIR: &str = ".uiforge";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub generation_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub history_dir: PathBuf,
    pub history_limit: usize,
    pub fallback_on_version_mismatch: bool,
    pub stable_ids: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            generation_url: DEFAULT_GENERATION_URL.to_string(),
            api_key: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            history_dir: PathBuf::from(DEFAULT_HISTORY_DIR),
            history_limit: DEFAULT_HISTORY_LIMIT,
            fallback_on_version_mismatch: false,
            stable_ids: false,
        }
    }
}

impl Config {
    /// Read `UIFORGE_*` variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Unset or unparseable values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let timeout_ms = get("UIFORGE_TIMEOUT_MS").and_then(|v| v.parse::<u64>().ok());
        let history_limit = get("UIFORGE_HISTORY_LIMIT")
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| *n > 0);

        Self {
            generation_url: get("UIFORGE_GENERATION_URL").unwrap_or(defaults.generation_url),
            api_key: get("UIFORGE_API_KEY"),
            timeout: timeout_ms.map(Duration::from_millis).unwrap_or(defaults.timeout),
            history_dir: get("UIFORGE_HISTORY_DIR").map(PathBuf::from).unwrap_or(defaults.history_dir),
            history_limit: history_limit.unwrap_or(defaults.history_limit),
            fallback_on_version_mismatch: get("UIFORGE_FALLBACK_ON_VERSION_MISMATCH")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.fallback_on_version_mismatch),
            stable_ids: get("UIFORGE_STABLE_IDS")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.stable_ids),
        }
    }

    pub fn ingest_policy(&self) -> IngestPolicy {
        IngestPolicy {
            fallback_on_version_mismatch: self.fallback_on_version_mismatch,
            validate: self.validate_options(),
            ..IngestPolicy::default()
        }
    }

    pub fn validate_options(&self) -> ValidateOptions {
        ValidateOptions {
            id_strategy: if self.stable_ids {
                IdStrategy::Structural
            } else {
                IdStrategy::Random
            },
            ..ValidateOptions::default()
        }
    }
}

fn parse_flag(v: &str) -> bool {
    matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
