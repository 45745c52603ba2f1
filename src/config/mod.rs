//! Application configuration loaded from CLI, environment, and files.
//!
//! Values are merged with ortho-config's layered approach.
//!
//! # Precedence
//!
//! Configuration values are loaded with the following precedence (lowest to
//! highest):
//!
//! 1. **Defaults** – Built-in application defaults
//! 2. **Configuration file** – `.hoarder.toml` in current directory, home
//!    directory, or XDG config directory
//! 3. **Environment variables** – `HOARDER_*`, plus the legacy
//!    `GITHUB_TOKEN` fallback for the token
//! 4. **Command-line arguments** – `--repositories`/`-r`, `--token`/`-t`, …
//!
//! # Configuration File
//!
//! ```toml
//! repositories = "rust-lang/log, https://github.com/serde-rs/json"
//! token = "ghp_example"
//! data_dir = "data"
//! progress_file = "verification.json"
//! max_attempts = 30
//! ```

use std::env;
use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::github::{HarvestError, RepositoryTarget, RetryPolicy};
use crate::ingest::HarvestSettings;
use crate::ingest::settings::DEFAULT_SECONDARY_POLL_INTERVAL;

const DEFAULT_API_BASE: &str = "https://api.github.com";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_PROGRESS_FILE: &str = "verification.json";
const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 10;
const DEFAULT_SECONDARY_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_MAX_ATTEMPTS: u32 = 30;
const DEFAULT_RETRY_WAIT_SECONDS: u64 = 10;
const DEFAULT_RATE_LIMIT_THRESHOLD: u64 = 10;
const DEFAULT_RESET_MARGIN_SECONDS: u64 = 50;

/// Harvester configuration supporting CLI, environment, and file sources.
///
/// # Example
///
/// ```no_run
/// use hoarder::HoarderConfig;
/// use ortho_config::OrthoConfig;
///
/// let config = HoarderConfig::load().expect("failed to load configuration");
/// let repositories = config.resolve_repositories().expect("repositories required");
/// let token = config.resolve_token().expect("token required");
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "HOARDER",
    discovery(
        dotfile_name = ".hoarder.toml",
        config_file_name = "hoarder.toml",
        app_name = "hoarder"
    )
)]
pub struct HoarderConfig {
    /// Repositories to harvest, separated by commas or whitespace. Each entry
    /// is `owner/repo` or a `https://github.com/owner/repo` URL.
    ///
    /// Can be provided via:
    /// - CLI: `--repositories <LIST>` or `-r <LIST>`
    /// - Environment: `HOARDER_REPOSITORIES`
    /// - Config file: `repositories = "..."`
    #[ortho_config(cli_short = 'r')]
    pub repositories: Option<String>,

    /// Personal access token for GitHub API authentication.
    ///
    /// Can be provided via:
    /// - CLI: `--token <TOKEN>` or `-t <TOKEN>`
    /// - Environment: `HOARDER_TOKEN` or `GITHUB_TOKEN` (legacy)
    /// - Config file: `token = "..."`
    #[ortho_config(cli_short = 't')]
    pub token: Option<String>,

    /// REST API root. Point this at a GitHub Enterprise instance
    /// (`https://host/api/v3`) or a test server.
    #[ortho_config()]
    pub api_base: String,

    /// Directory that receives page files.
    #[ortho_config(cli_short = 'd')]
    pub data_dir: String,

    /// Progress file tracking per-endpoint counters.
    #[ortho_config()]
    pub progress_file: String,

    /// Timeout for each page request, in seconds.
    #[ortho_config()]
    pub request_timeout_seconds: u64,

    /// Timeout for each per-issue comments or events lookup, in seconds.
    #[ortho_config()]
    pub secondary_timeout_seconds: u64,

    /// Attempts per page request before giving up on that page.
    #[ortho_config()]
    pub max_attempts: u32,

    /// Pause between attempts, in seconds.
    #[ortho_config()]
    pub retry_wait_seconds: u64,

    /// Sleep until the quota resets once this few calls remain.
    #[ortho_config()]
    pub rate_limit_threshold: u64,

    /// Extra seconds slept past the advertised quota reset.
    #[ortho_config()]
    pub reset_margin_seconds: u64,

    /// Emits telemetry events to stderr as JSON lines.
    ///
    /// Can be provided via:
    /// - CLI: `--telemetry`
    /// - Config file: `telemetry = true`
    ///
    /// Note: `HOARDER_TELEMETRY` is not supported because `ortho_config`
    /// does not load boolean values from the environment.
    #[ortho_config()]
    pub telemetry: bool,
}

impl Default for HoarderConfig {
    fn default() -> Self {
        Self {
            repositories: None,
            token: None,
            api_base: DEFAULT_API_BASE.to_owned(),
            data_dir: DEFAULT_DATA_DIR.to_owned(),
            progress_file: DEFAULT_PROGRESS_FILE.to_owned(),
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
            secondary_timeout_seconds: DEFAULT_SECONDARY_TIMEOUT_SECONDS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_wait_seconds: DEFAULT_RETRY_WAIT_SECONDS,
            rate_limit_threshold: DEFAULT_RATE_LIMIT_THRESHOLD,
            reset_margin_seconds: DEFAULT_RESET_MARGIN_SECONDS,
            telemetry: false,
        }
    }
}

impl HoarderConfig {
    /// Resolves the token from configuration or the legacy `GITHUB_TOKEN`
    /// environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::MissingToken`] when no token source provides a
    /// value.
    pub fn resolve_token(&self) -> Result<String, HarvestError> {
        self.token
            .clone()
            .or_else(|| env::var("GITHUB_TOKEN").ok())
            .filter(|token| !token.trim().is_empty())
            .ok_or(HarvestError::MissingToken)
    }

    /// Parses the repository list, preserving input order.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Configuration`] when the list is empty and
    /// [`HarvestError::InvalidRepository`] for the first unparseable entry.
    pub fn resolve_repositories(&self) -> Result<Vec<RepositoryTarget>, HarvestError> {
        let targets = self
            .repositories
            .as_deref()
            .unwrap_or_default()
            .split(|character: char| character == ',' || character.is_whitespace())
            .filter(|entry| !entry.is_empty())
            .map(RepositoryTarget::parse)
            .collect::<Result<Vec<_>, _>>()?;

        if targets.is_empty() {
            return Err(HarvestError::Configuration {
                message: "no repositories configured (use --repositories or -r)".to_owned(),
            });
        }
        Ok(targets)
    }

    /// Builds the immutable run context.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Configuration`] when `api_base` is not an
    /// absolute HTTP(S) URL.
    pub fn settings(&self) -> Result<HarvestSettings, HarvestError> {
        let api_base = Url::parse(&self.api_base).map_err(|error| HarvestError::Configuration {
            message: format!("invalid api_base '{}': {error}", self.api_base),
        })?;
        if !matches!(api_base.scheme(), "http" | "https") || api_base.cannot_be_a_base() {
            return Err(HarvestError::Configuration {
                message: format!("api_base '{}' must be an http(s) URL", self.api_base),
            });
        }

        Ok(HarvestSettings {
            api_base,
            data_dir: Utf8PathBuf::from(&self.data_dir),
            progress_file: Utf8PathBuf::from(&self.progress_file),
            retry: RetryPolicy {
                max_attempts: self.max_attempts.max(1),
                retry_wait: Duration::from_secs(self.retry_wait_seconds),
                timeout: Duration::from_secs(self.request_timeout_seconds),
                rate_limit_threshold: self.rate_limit_threshold,
                reset_margin: Duration::from_secs(self.reset_margin_seconds),
            },
            secondary_timeout: Duration::from_secs(self.secondary_timeout_seconds),
            secondary_poll_interval: DEFAULT_SECONDARY_POLL_INTERVAL,
        })
    }
}

#[cfg(test)]
mod tests;
