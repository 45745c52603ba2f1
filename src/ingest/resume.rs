//! Decides where an endpoint's harvest should pick up.
//!
//! The stored page pointer and the files on disk can disagree after a crash
//! (a page written but the counters not yet updated, or the reverse). The
//! planner trusts the filesystem: the first absent page file is always
//! refetched, whatever the pointer claims.

use tracing::debug;
use url::Url;

use crate::github::{EndpointSpec, HarvestError, RepositoryTarget, RequestExecutor, last_page};
use crate::persistence::{PageStore, ProgressStore};

/// Outcome of planning one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumePlan {
    /// Every page up to `last_page` is on disk and recorded.
    Complete {
        /// Total pages GitHub currently advertises.
        last_page: u32,
    },
    /// Pages from `start` through `last_page` still need fetching.
    Resume {
        /// First page to fetch.
        start: u32,
        /// Total pages GitHub currently advertises.
        last_page: u32,
    },
    /// GitHub answered the page-count probe with a non-200 status.
    Unavailable {
        /// Status returned for page 1.
        status: u16,
    },
}

/// Reconciles stored counters, live page totals and files on disk.
pub struct ResumePlanner<'a> {
    executor: &'a RequestExecutor<'a>,
    pages: &'a PageStore,
    progress: &'a ProgressStore,
    api_base: &'a Url,
}

impl<'a> ResumePlanner<'a> {
    /// Wires a planner from its collaborators.
    #[must_use]
    pub const fn new(
        executor: &'a RequestExecutor<'a>,
        pages: &'a PageStore,
        progress: &'a ProgressStore,
        api_base: &'a Url,
    ) -> Self {
        Self {
            executor,
            pages,
            progress,
            api_base,
        }
    }

    /// Fetches page 1 and reads the advertised page total from its `Link`
    /// header. Returns `Err(status)` inside `Ok` when GitHub refuses the
    /// listing.
    ///
    /// # Errors
    ///
    /// Propagates [`HarvestError::ExhaustedRetries`] from the executor and
    /// [`HarvestError::InvalidLinkHeader`] from pagination parsing.
    pub fn resolve_last_page(
        &self,
        target: &RepositoryTarget,
        endpoint: &EndpointSpec,
    ) -> Result<Result<u32, u16>, HarvestError> {
        let url = endpoint.page_url(self.api_base, target, 1)?;
        let response = self.executor.execute(url.as_str())?;
        if !response.is_ok() {
            return Ok(Err(response.status));
        }
        last_page(&response).map(Ok)
    }

    /// First page in `1..=last_page` whose file (or, for `issues`, whose
    /// derived comments or events file) is absent; `0` when none is missing.
    #[must_use]
    pub fn first_missing_page(
        &self,
        target: &RepositoryTarget,
        endpoint: &EndpointSpec,
        last_page: u32,
    ) -> u32 {
        let companions = companions_of(endpoint);
        (1..=last_page)
            .find(|&page| {
                !self.pages.page_exists(target, endpoint, page)
                    || companions
                        .iter()
                        .any(|companion| !self.pages.page_exists(target, companion, page))
            })
            .unwrap_or(0)
    }

    /// Plans the next harvest of `endpoint`.
    ///
    /// # Errors
    ///
    /// Propagates failures from [`Self::resolve_last_page`] and from reading
    /// the progress store.
    pub fn plan(
        &self,
        target: &RepositoryTarget,
        endpoint: &EndpointSpec,
    ) -> Result<ResumePlan, HarvestError> {
        let last_page = match self.resolve_last_page(target, endpoint)? {
            Ok(last_page) => last_page,
            Err(status) => return Ok(ResumePlan::Unavailable { status }),
        };
        let record = self.progress.get(target, &endpoint.resource_key())?;
        let missing = self.first_missing_page(target, endpoint, last_page);

        let plan = decide(record.current_page_number, last_page, missing);
        debug!(
            repository = %target,
            resource = %endpoint,
            stored_page = record.current_page_number,
            last_page,
            first_missing = missing,
            ?plan,
            "planned endpoint"
        );
        Ok(plan)
    }

    /// True when nothing needs fetching for `endpoint`.
    ///
    /// # Errors
    ///
    /// Propagates failures from [`Self::plan`].
    pub fn is_fully_downloaded(
        &self,
        target: &RepositoryTarget,
        endpoint: &EndpointSpec,
    ) -> Result<bool, HarvestError> {
        self.plan(target, endpoint)
            .map(|plan| matches!(plan, ResumePlan::Complete { .. }))
    }
}

/// Derived endpoints whose files are written alongside `endpoint`'s pages.
fn companions_of(endpoint: &EndpointSpec) -> &'static [EndpointSpec] {
    const ISSUE_COMPANIONS: [EndpointSpec; 2] =
        [EndpointSpec::ISSUES_COMMENTS, EndpointSpec::ISSUES_EVENTS];
    if *endpoint == EndpointSpec::ISSUES {
        &ISSUE_COMPANIONS
    } else {
        &[]
    }
}

/// Pure planning rule.
///
/// A pointer behind `last_page` resumes right after it, unless an earlier
/// page file is missing. A pointer at (or beyond) `last_page` is complete
/// only when no file is missing.
const fn decide(stored_page: u32, last_page: u32, first_missing: u32) -> ResumePlan {
    if stored_page < last_page {
        let after_pointer = stored_page + 1;
        let start = if first_missing != 0 && first_missing < after_pointer {
            first_missing
        } else {
            after_pointer
        };
        ResumePlan::Resume { start, last_page }
    } else if first_missing != 0 {
        ResumePlan::Resume {
            start: first_missing,
            last_page,
        }
    } else {
        ResumePlan::Complete { last_page }
    }
}
