//! Immutable run context handed to every ingestion component.

use std::time::Duration;

use camino::Utf8PathBuf;
use url::Url;

use crate::github::RetryPolicy;

/// Default pause between quota polls before a per-issue lookup.
pub const DEFAULT_SECONDARY_POLL_INTERVAL: Duration = Duration::from_secs(10);
/// Default timeout for per-issue lookups.
pub const DEFAULT_SECONDARY_TIMEOUT: Duration = Duration::from_secs(30);

/// Resolved settings for one harvesting run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestSettings {
    /// REST API root, e.g. `https://api.github.com`.
    pub api_base: Url,
    /// Root directory for page files.
    pub data_dir: Utf8PathBuf,
    /// Location of the progress file.
    pub progress_file: Utf8PathBuf,
    /// Retry and quota behaviour for primary page fetches.
    pub retry: RetryPolicy,
    /// Timeout for each per-issue comments or events lookup.
    pub secondary_timeout: Duration,
    /// Pause between quota polls while waiting for headroom before a
    /// per-issue lookup.
    pub secondary_poll_interval: Duration,
}

impl HarvestSettings {
    /// Settings with default timing for the given locations.
    #[must_use]
    pub fn new(api_base: Url, data_dir: Utf8PathBuf, progress_file: Utf8PathBuf) -> Self {
        Self {
            api_base,
            data_dir,
            progress_file,
            retry: RetryPolicy::default(),
            secondary_timeout: DEFAULT_SECONDARY_TIMEOUT,
            secondary_poll_interval: DEFAULT_SECONDARY_POLL_INTERVAL,
        }
    }
}
