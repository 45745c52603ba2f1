//! Shared test utilities.

use camino::{Utf8Path, Utf8PathBuf};
use hoarder::telemetry::NoopTelemetrySink;
use hoarder::{
    EndpointSpec, HarvestError, HarvestSummary, HoarderConfig, PageStore, RepositoryTarget,
};
use serde_json::Value;
use tempfile::TempDir;

pub mod github_mocks;
pub mod runtime;

/// Creates a temporary directory for harvest output.
///
/// # Panics
///
/// Panics if the temporary directory cannot be created.
pub fn create_temp_dir() -> TempDir {
    TempDir::new().unwrap_or_else(|error| panic!("failed to create temporary directory: {error}"))
}

/// UTF-8 view of a temporary directory.
///
/// # Panics
///
/// Panics if the path is not valid UTF-8.
pub fn utf8_root(temp_dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf())
        .unwrap_or_else(|path| panic!("temporary path is not UTF-8: {}", path.display()))
}

/// Configuration pointing at a mock server and a scratch workspace, with
/// retries kept short.
pub fn test_config(api_base: &str, workspace: &Utf8Path, repositories: &str) -> HoarderConfig {
    HoarderConfig {
        repositories: Some(repositories.to_owned()),
        token: Some("test-token".to_owned()),
        api_base: api_base.to_owned(),
        data_dir: workspace.join("data").to_string(),
        progress_file: workspace.join("verification.json").to_string(),
        max_attempts: 2,
        retry_wait_seconds: 0,
        request_timeout_seconds: 5,
        secondary_timeout_seconds: 5,
        ..HoarderConfig::default()
    }
}

/// Runs a complete harvest with telemetry switched off.
///
/// # Errors
///
/// Returns the first fatal error raised by the run.
pub fn run_harvest(config: &HoarderConfig) -> Result<HarvestSummary, HarvestError> {
    hoarder::run_harvest(config, &NoopTelemetrySink)
}

/// Reads a harvested page file straight from the data directory.
///
/// # Panics
///
/// Panics if the file is missing or is not JSON.
pub fn read_page(
    data_dir: &Utf8Path,
    target: &RepositoryTarget,
    endpoint: &EndpointSpec,
    page: u32,
) -> Value {
    let path = data_dir.join(PageStore::relative_path(target, endpoint, page));
    let raw = std::fs::read_to_string(&path)
        .unwrap_or_else(|error| panic!("page {path} should be readable: {error}"));
    serde_json::from_str(&raw).unwrap_or_else(|error| panic!("page {path} should parse: {error}"))
}
