//! End-to-end harvest wiring shared by the binary and the integration
//! tests.

use tracing::{info, warn};

use super::{HarvestSummary, IngestionOrchestrator, SecondaryFetcher};
use crate::config::HoarderConfig;
use crate::github::{
    CORE_CATEGORY, HarvestError, HttpRateLimitProbe, PersonalAccessToken, RateLimitProbe,
    RequestExecutor, ReqwestTransport, SystemClock, validate_token,
};
use crate::persistence::{PageStore, ProgressStore};
use crate::telemetry::TelemetrySink;

/// Runs a complete harvest for `config`.
///
/// Resolves settings, repositories and the token, validates the token
/// against `/user`, logs the core quota, opens the progress and page
/// stores, then drives the orchestrator over every repository.
///
/// # Errors
///
/// Returns configuration and authentication failures before any request
/// is made for repository data, and the first fatal error raised while
/// harvesting.
pub fn run_harvest(
    config: &HoarderConfig,
    telemetry: &dyn TelemetrySink,
) -> Result<HarvestSummary, HarvestError> {
    let settings = config.settings()?;
    let targets = config.resolve_repositories()?;
    let token = PersonalAccessToken::new(config.resolve_token()?)?;

    let transport = ReqwestTransport::new(token)?;
    let probe = HttpRateLimitProbe::new(&transport, &settings.api_base, settings.retry.timeout)?;
    let clock = SystemClock;
    let executor = RequestExecutor::new(&transport, &probe, &clock, telemetry, settings.retry);

    validate_token(&executor, &settings.api_base)?;
    match probe.status(CORE_CATEGORY) {
        Ok(quota) => info!(
            limit = quota.limit(),
            remaining = quota.remaining(),
            reset_at = ?quota.reset_at_utc(),
            "core quota"
        ),
        Err(error) => warn!("could not read core quota: {error}"),
    }

    let progress = ProgressStore::open(&settings.progress_file)?;
    let pages = PageStore::open(&settings.data_dir)?;
    info!(progress = %progress.path(), data_dir = %settings.data_dir, "stores opened");
    let secondary = SecondaryFetcher::new(
        &transport,
        &probe,
        &clock,
        telemetry,
        settings.secondary_timeout,
        settings.secondary_poll_interval,
    );
    let orchestrator = IngestionOrchestrator::new(
        &executor,
        &secondary,
        &progress,
        &pages,
        telemetry,
        &settings.api_base,
    );

    orchestrator.run(&targets)
}
