//! Run settings
//!
//! Layered configuration: built-in defaults, an optional YAML settings file,
//! environment variables, then command-line flags (applied by the CLI).

use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::pagination::PaginationConfig;
use crate::types::{BackoffType, OutputFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the output directory
pub const OUTPUT_DIR_ENV_VAR: &str = "GH_HARVEST_OUTPUT_DIR";

/// GitHub media type sent with every request
pub const GITHUB_ACCEPT: &str = "application/vnd.github+json";

// ============================================================================
// Settings
// ============================================================================

/// Settings for a harvest run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// GraphQL endpoint
    #[serde(default = "default_graphql_url")]
    pub graphql_url: String,

    /// REST API base URL
    #[serde(default = "default_rest_url")]
    pub rest_url: String,

    /// File holding the personal access token
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,

    /// Directory for output tables
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Output table format
    #[serde(default)]
    pub format: OutputFormat,

    /// Work items processed at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// HTTP behaviour
    #[serde(default)]
    pub http: HttpSettings,

    /// Per-page timeout in seconds (none by default)
    #[serde(default)]
    pub page_timeout_seconds: Option<u64>,

    /// Time budget for the whole run in seconds (none by default)
    #[serde(default)]
    pub deadline_seconds: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            graphql_url: default_graphql_url(),
            rest_url: default_rest_url(),
            token_file: default_token_file(),
            output_dir: default_output_dir(),
            format: OutputFormat::default(),
            concurrency: default_concurrency(),
            http: HttpSettings::default(),
            page_timeout_seconds: None,
            deadline_seconds: None,
        }
    }
}

fn default_graphql_url() -> String {
    "https://api.github.com/graphql".to_string()
}

fn default_rest_url() -> String {
    "https://api.github.com".to_string()
}

fn default_token_file() -> PathBuf {
    PathBuf::from("gh_key")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_concurrency() -> usize {
    1
}

/// HTTP client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpSettings {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff between retries
    #[serde(default)]
    pub backoff: BackoffSettings,

    /// Client-side rate limit; `null` disables it
    #[serde(default = "default_rate_limit")]
    pub rate_limit: Option<RateLimiterConfig>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            backoff: BackoffSettings::default(),
            rate_limit: default_rate_limit(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

#[allow(clippy::unnecessary_wraps)]
fn default_rate_limit() -> Option<RateLimiterConfig> {
    Some(RateLimiterConfig::default())
}

/// Retry backoff settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackoffSettings {
    /// Backoff curve
    #[serde(default, rename = "type")]
    pub backoff_type: BackoffType,

    /// First delay in milliseconds
    #[serde(default = "default_initial_backoff")]
    pub initial_ms: u64,

    /// Delay cap in milliseconds; longer GitHub rate-limit waits fail fast
    #[serde(default = "default_max_backoff")]
    pub max_ms: u64,
}

impl Default for BackoffSettings {
    fn default() -> Self {
        Self {
            backoff_type: BackoffType::default(),
            initial_ms: default_initial_backoff(),
            max_ms: default_max_backoff(),
        }
    }
}

fn default_initial_backoff() -> u64 {
    500
}

fn default_max_backoff() -> u64 {
    60_000
}

// ============================================================================
// Loading
// ============================================================================

impl Settings {
    /// Load settings from a YAML file, or defaults when no file is given
    ///
    /// Environment overrides are applied on top. The result is not validated:
    /// callers layer their own overrides first, then call [`Settings::validate`].
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_env_with(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Parse a settings file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::config(format!(
                    "Failed to read settings file '{}': {e}",
                    path.display()
                ))
            }
        })?;
        Self::from_yaml(&content)
    }

    /// Parse settings from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Failed to parse settings: {e}")))
    }

    /// Apply environment overrides using the given lookup
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(OUTPUT_DIR_ENV_VAR).filter(|d| !d.trim().is_empty()) {
            self.output_dir = PathBuf::from(dir);
        }
    }

    /// Check values that would otherwise fail later
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::invalid_value(
                "concurrency",
                "must be at least 1",
            ));
        }
        if self.http.timeout_seconds == 0 {
            return Err(Error::invalid_value(
                "http.timeout_seconds",
                "must be at least 1",
            ));
        }
        if self.page_timeout_seconds == Some(0) {
            return Err(Error::invalid_value(
                "page_timeout_seconds",
                "must be at least 1",
            ));
        }
        if self.deadline_seconds == Some(0) {
            return Err(Error::invalid_value(
                "deadline_seconds",
                "must be at least 1",
            ));
        }
        for (field, url) in [("graphql_url", &self.graphql_url), ("rest_url", &self.rest_url)] {
            url::Url::parse(url)
                .map_err(|e| Error::invalid_value(field, format!("'{url}': {e}")))?;
        }
        Ok(())
    }

    /// HTTP client configuration for these settings
    ///
    /// Relative REST paths resolve against `rest_url`.
    pub fn http_client_config(&self) -> HttpClientConfig {
        let http = &self.http;
        let mut builder = HttpClientConfig::builder()
            .base_url(&self.rest_url)
            .timeout(Duration::from_secs(http.timeout_seconds))
            .max_retries(http.max_retries)
            .backoff(
                http.backoff.backoff_type,
                Duration::from_millis(http.backoff.initial_ms),
                Duration::from_millis(http.backoff.max_ms),
            )
            .header("Accept", GITHUB_ACCEPT);

        builder = match &http.rate_limit {
            Some(limit) => builder.rate_limit(limit.clone()),
            None => builder.no_rate_limit(),
        };
        builder.build()
    }

    /// Apply the page timeout and run deadline to a pagination config
    pub fn apply_timeouts(&self, config: PaginationConfig) -> PaginationConfig {
        config
            .with_page_timeout(self.page_timeout_seconds.map(Duration::from_secs))
            .with_time_budget(self.deadline_seconds.map(Duration::from_secs))
    }
}
