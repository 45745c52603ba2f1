//! Harvest telemetry events and sinks.
//!
//! Conditions that the harvester absorbs locally (retries, skipped pages,
//! failed per-issue lookups) are recorded here so that they stay countable
//! instead of disappearing into the log.

use std::io;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// A structured telemetry event emitted by the harvester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryEvent {
    /// The quota was nearly exhausted and the harvester slept until reset.
    RateLimitSleep {
        /// Calls remaining when the sleep started.
        remaining: u64,
        /// Seconds slept.
        sleep_secs: u64,
    },
    /// A transport failure triggered another attempt.
    RequestRetried {
        /// URL being fetched.
        url: String,
        /// Attempt number that failed (1-based).
        attempt: u32,
        /// Transport error text.
        reason: String,
    },
    /// A page was written to disk.
    PagePersisted {
        /// `owner_repo` key.
        repository: String,
        /// Resource key of the endpoint.
        resource: String,
        /// Page number.
        page: u32,
        /// Items in the page.
        items: u64,
    },
    /// A page could not be fetched or decoded and stays pending.
    PageSkipped {
        /// `owner_repo` key.
        repository: String,
        /// Resource key of the endpoint.
        resource: String,
        /// Page number.
        page: u32,
        /// Why the page was skipped.
        reason: String,
    },
    /// A per-issue comments or events lookup failed.
    SecondaryFetchFailed {
        /// URL that failed.
        url: String,
        /// Failure detail.
        reason: String,
    },
    /// An endpoint reached its last page.
    EndpointCompleted {
        /// `owner_repo` key.
        repository: String,
        /// Resource key of the endpoint.
        resource: String,
        /// Total pages advertised by GitHub.
        last_page: u32,
    },
}

/// A sink that can record telemetry events.
pub trait TelemetrySink: Send + Sync {
    /// Records a telemetry event.
    fn record(&self, event: TelemetryEvent);
}

/// Telemetry sink that drops all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetrySink;

impl TelemetrySink for NoopTelemetrySink {
    fn record(&self, _event: TelemetryEvent) {}
}

/// Records telemetry events to stderr as JSON lines (JSONL).
///
/// This is intended for local debugging and is not transmitted anywhere.
#[derive(Debug, Default)]
pub struct StderrJsonlTelemetrySink;

impl TelemetrySink for StderrJsonlTelemetrySink {
    fn record(&self, event: TelemetryEvent) {
        let Ok(serialised) = serde_json::to_string(&event) else {
            return;
        };

        let _ignored = writeln_stderr(&serialised);
    }
}

fn writeln_stderr(message: &str) -> io::Result<()> {
    use io::Write;

    let mut stderr = io::stderr().lock();
    writeln!(stderr, "{message}")
}

/// Keeps every event in memory; handy for inspecting a finished run.
#[derive(Debug, Default)]
pub struct RecordingTelemetrySink {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl RecordingTelemetrySink {
    /// Drains and returns the recorded events.
    #[must_use]
    pub fn take(&self) -> Vec<TelemetryEvent> {
        self.events
            .lock()
            .map(|mut events| events.drain(..).collect())
            .unwrap_or_default()
    }
}

impl TelemetrySink for RecordingTelemetrySink {
    fn record(&self, event: TelemetryEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
