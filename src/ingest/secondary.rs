//! Per-issue comments and events lookups.
//!
//! Each issue on an `issues` page carries a `comments_url` and an
//! `events_url`. Both are fetched once, unpaginated, with a longer timeout
//! and no retry. A failed lookup leaves that issue without comments or
//! events but is reported to the caller and to telemetry.

use std::time::Duration;

use serde_json::Value;
use tracing::{info, warn};

use crate::github::{CORE_CATEGORY, Clock, HarvestError, RateLimitProbe, Transport};
use crate::telemetry::{TelemetryEvent, TelemetrySink};

const EVENTS_SUFFIX: &str = "/events";

/// Items fetched for one issue. Each lookup succeeds or fails on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueActivity {
    /// Result of the comments lookup.
    pub comments: Result<Vec<Value>, HarvestError>,
    /// Result of the events lookup, with each event's `url` pointing at the
    /// issue.
    pub events: Result<Vec<Value>, HarvestError>,
}

impl IssueActivity {
    /// Number of lookups that failed (0 to 2).
    #[must_use]
    pub fn failures(&self) -> u64 {
        u64::from(self.comments.is_err()) + u64::from(self.events.is_err())
    }
}

/// Fetches comments and events for single issues.
pub struct SecondaryFetcher<'a> {
    transport: &'a dyn Transport,
    probe: &'a dyn RateLimitProbe,
    clock: &'a dyn Clock,
    telemetry: &'a dyn TelemetrySink,
    timeout: Duration,
    poll_interval: Duration,
}

impl<'a> SecondaryFetcher<'a> {
    /// Wires a fetcher from its collaborators.
    #[must_use]
    pub const fn new(
        transport: &'a dyn Transport,
        probe: &'a dyn RateLimitProbe,
        clock: &'a dyn Clock,
        telemetry: &'a dyn TelemetrySink,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            transport,
            probe,
            clock,
            telemetry,
            timeout,
            poll_interval,
        }
    }

    /// Fetches one issue's comments and events.
    #[must_use]
    pub fn fetch(&self, comments_url: &str, events_url: &str) -> IssueActivity {
        let comments = self.fetch_items(comments_url);
        let events = self.fetch_items(events_url).map(|mut events| {
            let issue_url = events_url.strip_suffix(EVENTS_SUFFIX).unwrap_or(events_url);
            point_events_at_issue(&mut events, issue_url);
            events
        });
        IssueActivity { comments, events }
    }

    fn fetch_items(&self, url: &str) -> Result<Vec<Value>, HarvestError> {
        self.wait_for_headroom();
        let outcome = self.request(url);
        if let Err(error) = &outcome {
            warn!(%url, "issue lookup failed: {error}");
            self.telemetry.record(TelemetryEvent::SecondaryFetchFailed {
                url: url.to_owned(),
                reason: error.to_string(),
            });
        }
        outcome
    }

    fn request(&self, url: &str) -> Result<Vec<Value>, HarvestError> {
        let response = self
            .transport
            .get(url, self.timeout)
            .map_err(|error| HarvestError::Network {
                message: error.to_string(),
            })?;
        info!(status = response.status, url = %response.url, "issue lookup completed");
        if !response.is_ok() {
            return Err(HarvestError::Api {
                message: format!("{url} returned status {}", response.status),
            });
        }
        match response.json()? {
            Value::Array(items) => Ok(items),
            other => Err(HarvestError::MalformedPayload {
                url: response.url,
                message: format!("expected a JSON array, got {}", json_kind(&other)),
            }),
        }
    }

    /// Blocks until at least one call is left in the core quota.
    ///
    /// A failing probe ends the wait; the lookup itself will report any real
    /// problem.
    fn wait_for_headroom(&self) {
        loop {
            match self.probe.status(CORE_CATEGORY) {
                Ok(info) if info.remaining() >= 1 => return,
                Ok(info) => {
                    info!(
                        reset_at = ?info.reset_at_utc(),
                        wait_secs = self.poll_interval.as_secs(),
                        "core quota exhausted; waiting before issue lookup"
                    );
                    self.clock.sleep(self.poll_interval);
                }
                Err(error) => {
                    warn!("skipping rate limit check: {error}");
                    return;
                }
            }
        }
    }
}

/// Replaces the `url` of every event that has one.
fn point_events_at_issue(events: &mut [Value], issue_url: &str) {
    for event in events {
        if let Some(url) = event.get_mut("url") {
            *url = Value::String(issue_url.to_owned());
        }
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
