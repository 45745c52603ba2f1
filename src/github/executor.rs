//! Rate-limit aware GET with bounded retries.
//!
//! Before each call the executor checks the live quota. When fewer than the
//! configured threshold of calls remain it sleeps until the window resets
//! (plus a safety margin) and then proceeds without checking again. Transport
//! failures are retried with a fixed back-off; any HTTP response, successful
//! or not, ends the loop and is handed back for the caller to interpret.

use std::time::Duration;

use tracing::{info, warn};

use super::clock::Clock;
use super::error::HarvestError;
use super::rate_limit::{CORE_CATEGORY, RateLimitProbe};
use super::transport::{ApiResponse, Transport};
use crate::telemetry::{TelemetryEvent, TelemetrySink};

/// Retry and quota-preemption knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per call, including the first.
    pub max_attempts: u32,
    /// Fixed pause between attempts.
    pub retry_wait: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Sleep until reset when `remaining` is at or below this value.
    pub rate_limit_threshold: u64,
    /// Extra seconds slept past the advertised reset.
    pub reset_margin: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            retry_wait: Duration::from_secs(10),
            timeout: Duration::from_secs(10),
            rate_limit_threshold: 10,
            reset_margin: Duration::from_secs(50),
        }
    }
}

/// Issues GET requests on behalf of the harvester.
pub struct RequestExecutor<'a> {
    transport: &'a dyn Transport,
    probe: &'a dyn RateLimitProbe,
    clock: &'a dyn Clock,
    telemetry: &'a dyn TelemetrySink,
    policy: RetryPolicy,
}

impl<'a> RequestExecutor<'a> {
    /// Wires an executor from its collaborators.
    #[must_use]
    pub const fn new(
        transport: &'a dyn Transport,
        probe: &'a dyn RateLimitProbe,
        clock: &'a dyn Clock,
        telemetry: &'a dyn TelemetrySink,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            probe,
            clock,
            telemetry,
            policy,
        }
    }

    /// The policy in force.
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches `url`.
    ///
    /// Non-200 responses are returned as-is; they are not retried.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::ExhaustedRetries`] when every attempt failed
    /// at the transport level.
    pub fn execute(&self, url: &str) -> Result<ApiResponse, HarvestError> {
        self.wait_for_quota();

        let max_attempts = self.policy.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            match self.transport.get(url, self.policy.timeout) {
                Ok(response) => {
                    info!(
                        status = response.status,
                        url = %response.url,
                        attempt,
                        "GitHub request completed"
                    );
                    return Ok(response);
                }
                Err(error) => {
                    warn!(
                        %url,
                        attempt,
                        max_attempts,
                        retry_in_secs = self.policy.retry_wait.as_secs(),
                        "{error}"
                    );
                    self.telemetry.record(TelemetryEvent::RequestRetried {
                        url: url.to_owned(),
                        attempt,
                        reason: error.to_string(),
                    });
                    if attempt < max_attempts {
                        self.clock.sleep(self.policy.retry_wait);
                    }
                }
            }
        }

        Err(HarvestError::ExhaustedRetries {
            url: url.to_owned(),
            attempts: max_attempts,
        })
    }

    /// Sleeps past the quota reset when the remaining budget is low.
    ///
    /// A failing quota probe does not block the request; the call itself
    /// will surface any real problem.
    fn wait_for_quota(&self) {
        let info = match self.probe.status(CORE_CATEGORY) {
            Ok(info) => info,
            Err(error) => {
                warn!("skipping rate limit check: {error}");
                return;
            }
        };

        if info.remaining() > self.policy.rate_limit_threshold {
            return;
        }

        let wait = Duration::from_secs(info.seconds_until_reset_from(self.clock.now_unix()))
            + self.policy.reset_margin;
        info!(
            remaining = info.remaining(),
            reset_at = ?info.reset_at_utc(),
            sleep_secs = wait.as_secs(),
            "rate limit nearly exhausted, sleeping until reset"
        );
        self.telemetry.record(TelemetryEvent::RateLimitSleep {
            remaining: info.remaining(),
            sleep_secs: wait.as_secs(),
        });
        self.clock.sleep(wait);
    }
}
