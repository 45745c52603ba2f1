//! Top-level harvest driver.
//!
//! Repositories are processed in input order; within each one the seven
//! endpoints are visited in [`EndpointSpec::ALL`] order. The two derived
//! endpoints are skipped there because their files are produced while the
//! `issues` pages are processed.
//!
//! Per endpoint the flow is: plan, then for every pending page fetch, write
//! the page (and, for `issues`, its derived comments and events files), and
//! only then record the page in the progress store. A page that cannot be
//! fetched or decoded is skipped without touching the progress store, so the
//! next run starts there again.

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use url::Url;

use super::resume::{ResumePlan, ResumePlanner};
use super::secondary::SecondaryFetcher;
use crate::github::{EndpointSpec, HarvestError, RepositoryTarget, RequestExecutor};
use crate::persistence::{PageStore, ProgressStore};
use crate::telemetry::{TelemetryEvent, TelemetrySink};

/// Counts describing a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HarvestSummary {
    /// Primary pages written.
    pub pages_persisted: u64,
    /// Primary pages skipped because they could not be fetched or decoded.
    pub pages_skipped: u64,
    /// Endpoints that were already fully downloaded.
    pub endpoints_complete: u64,
    /// Endpoints whose listing GitHub refused or whose page total could not
    /// be resolved.
    pub endpoints_unavailable: u64,
    /// Per-issue comments or events lookups that succeeded.
    pub secondary_succeeded: u64,
    /// Per-issue comments or events lookups that failed.
    pub secondary_failed: u64,
}

impl fmt::Display for HarvestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pages persisted: {}, pages skipped: {}, endpoints already complete: {}, \
             endpoints unavailable: {}, issue lookups: {} ok / {} failed",
            self.pages_persisted,
            self.pages_skipped,
            self.endpoints_complete,
            self.endpoints_unavailable,
            self.secondary_succeeded,
            self.secondary_failed,
        )
    }
}

/// Drives a full harvest over a list of repositories.
pub struct IngestionOrchestrator<'a> {
    executor: &'a RequestExecutor<'a>,
    secondary: &'a SecondaryFetcher<'a>,
    progress: &'a ProgressStore,
    pages: &'a PageStore,
    telemetry: &'a dyn TelemetrySink,
    api_base: &'a Url,
}

/// Comments and events gathered for one `issues` page.
#[derive(Default)]
struct PageActivity {
    comments: Vec<Value>,
    events: Vec<Value>,
}

impl<'a> IngestionOrchestrator<'a> {
    /// Wires an orchestrator from its collaborators.
    #[must_use]
    pub const fn new(
        executor: &'a RequestExecutor<'a>,
        secondary: &'a SecondaryFetcher<'a>,
        progress: &'a ProgressStore,
        pages: &'a PageStore,
        telemetry: &'a dyn TelemetrySink,
        api_base: &'a Url,
    ) -> Self {
        Self {
            executor,
            secondary,
            progress,
            pages,
            telemetry,
            api_base,
        }
    }

    /// Harvests every endpoint of every repository.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error (see [`HarvestError::is_fatal`]), such
    /// as a corrupt progress file or a failed page write. Transient problems
    /// are absorbed and counted in the summary.
    pub fn run(&self, targets: &[RepositoryTarget]) -> Result<HarvestSummary, HarvestError> {
        let mut summary = HarvestSummary::default();
        for target in targets {
            info!(repository = %target, "harvesting repository");
            self.progress.ensure_defaults(target, &EndpointSpec::ALL)?;
            for endpoint in EndpointSpec::ALL.iter().filter(|spec| !spec.is_derived()) {
                self.harvest_endpoint(target, endpoint, &mut summary)?;
            }
        }
        info!(%summary, "harvest finished");
        Ok(summary)
    }

    fn harvest_endpoint(
        &self,
        target: &RepositoryTarget,
        endpoint: &EndpointSpec,
        summary: &mut HarvestSummary,
    ) -> Result<(), HarvestError> {
        let planner = ResumePlanner::new(self.executor, self.pages, self.progress, self.api_base);
        let plan = match planner.plan(target, endpoint) {
            Ok(plan) => plan,
            Err(error) if !error.is_fatal() => {
                warn!(
                    repository = %target,
                    resource = %endpoint,
                    "cannot resolve page total: {error}"
                );
                summary.endpoints_unavailable += 1;
                return Ok(());
            }
            Err(error) => return Err(error),
        };

        match plan {
            ResumePlan::Unavailable { status } => {
                warn!(repository = %target, resource = %endpoint, status, "endpoint unavailable");
                summary.endpoints_unavailable += 1;
            }
            ResumePlan::Complete { last_page } => {
                info!(repository = %target, resource = %endpoint, last_page, "already downloaded");
                summary.endpoints_complete += 1;
            }
            ResumePlan::Resume { start, last_page } => {
                info!(repository = %target, resource = %endpoint, start, last_page, "resuming");
                let skipped_before = summary.pages_skipped;
                for page in start..=last_page {
                    self.harvest_page(target, endpoint, page, last_page, summary)?;
                }
                let record = self.progress.get(target, &endpoint.resource_key())?;
                if summary.pages_skipped == skipped_before
                    && record.current_page_number == last_page
                {
                    self.telemetry.record(TelemetryEvent::EndpointCompleted {
                        repository: target.key(),
                        resource: endpoint.resource_key(),
                        last_page,
                    });
                }
            }
        }
        Ok(())
    }

    fn harvest_page(
        &self,
        target: &RepositoryTarget,
        endpoint: &EndpointSpec,
        page: u32,
        last_page: u32,
        summary: &mut HarvestSummary,
    ) -> Result<(), HarvestError> {
        let url = endpoint.page_url(self.api_base, target, page)?;
        let payload = match self.fetch_page(url.as_str()) {
            Ok(payload) => payload,
            Err(error) if !error.is_fatal() => {
                self.skip_page(target, endpoint, page, &error.to_string());
                summary.pages_skipped += 1;
                return Ok(());
            }
            Err(error) => return Err(error),
        };

        let path = self.pages.write_page(target, endpoint, page, &payload)?;
        let items = item_count(&payload);

        if *endpoint == EndpointSpec::ISSUES {
            let activity = self.collect_activity(&payload, summary);
            self.persist_derived(
                target,
                &EndpointSpec::ISSUES_COMMENTS,
                page,
                last_page,
                activity.comments,
            )?;
            self.persist_derived(
                target,
                &EndpointSpec::ISSUES_EVENTS,
                page,
                last_page,
                activity.events,
            )?;
        }

        self.progress
            .apply_page_result(target, &endpoint.resource_key(), page, last_page, items)?;
        info!(
            repository = %target,
            resource = %endpoint,
            page,
            last_page,
            items,
            %path,
            "page persisted"
        );
        self.telemetry.record(TelemetryEvent::PagePersisted {
            repository: target.key(),
            resource: endpoint.resource_key(),
            page,
            items,
        });
        summary.pages_persisted += 1;
        Ok(())
    }

    /// Fetches one page and decodes it. Non-200 answers become
    /// [`HarvestError::Api`].
    fn fetch_page(&self, url: &str) -> Result<Value, HarvestError> {
        let response = self.executor.execute(url)?;
        if !response.is_ok() {
            return Err(HarvestError::Api {
                message: format!("{url} returned status {}", response.status),
            });
        }
        response.json()
    }

    fn skip_page(
        &self,
        target: &RepositoryTarget,
        endpoint: &EndpointSpec,
        page: u32,
        reason: &str,
    ) {
        warn!(repository = %target, resource = %endpoint, page, "skipping page: {reason}");
        self.telemetry.record(TelemetryEvent::PageSkipped {
            repository: target.key(),
            resource: endpoint.resource_key(),
            page,
            reason: reason.to_owned(),
        });
    }

    /// Looks up comments and events for every issue on the page that links
    /// to both.
    fn collect_activity(&self, payload: &Value, summary: &mut HarvestSummary) -> PageActivity {
        let mut activity = PageActivity::default();
        let Some(issues) = payload.as_array() else {
            return activity;
        };

        for issue in issues {
            let (Some(comments_url), Some(events_url)) = (
                issue.get("comments_url").and_then(Value::as_str),
                issue.get("events_url").and_then(Value::as_str),
            ) else {
                continue;
            };

            let fetched = self.secondary.fetch(comments_url, events_url);
            let failed = fetched.failures();
            summary.secondary_failed += failed;
            summary.secondary_succeeded += 2 - failed;
            if let Ok(comments) = fetched.comments {
                activity.comments.extend(comments);
            }
            if let Ok(events) = fetched.events {
                activity.events.extend(events);
            }
        }
        activity
    }

    fn persist_derived(
        &self,
        target: &RepositoryTarget,
        endpoint: &EndpointSpec,
        page: u32,
        last_page: u32,
        items: Vec<Value>,
    ) -> Result<(), HarvestError> {
        let count = u64::try_from(items.len()).unwrap_or(u64::MAX);
        self.pages
            .write_page(target, endpoint, page, &Value::Array(items))?;
        self.progress
            .apply_page_result(target, &endpoint.resource_key(), page, last_page, count)?;
        Ok(())
    }
}

/// Items on a page: the array length, or the number of top-level keys for
/// an object body.
fn item_count(payload: &Value) -> u64 {
    let count = match payload {
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        _ => 0,
    };
    u64::try_from(count).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
