//! Rate limit quota as reported by GitHub's `/rate_limit` endpoint.
//!
//! The probe is uncached: every call is a fresh round-trip.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use url::Url;

use super::error::HarvestError;
use super::transport::Transport;

/// Quota category used for REST calls.
pub const CORE_CATEGORY: &str = "core";

/// Quota figures for one category.
///
/// # Example
///
/// ```
/// use hoarder::github::rate_limit::RateLimitInfo;
///
/// let info = RateLimitInfo::new(5000, 4999, 1_700_000_000);
/// assert!(!info.is_exhausted());
/// assert_eq!(info.remaining(), 4999);
/// assert_eq!(info.seconds_until_reset_from(1_699_999_880), 120);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RateLimitInfo {
    /// Maximum requests allowed in the current window.
    limit: u64,
    /// Remaining requests in the current window.
    remaining: u64,
    /// Unix timestamp when the window resets.
    #[serde(rename = "reset")]
    reset_at: u64,
}

impl RateLimitInfo {
    /// Creates a new rate limit info instance.
    #[must_use]
    pub const fn new(limit: u64, remaining: u64, reset_at: u64) -> Self {
        Self {
            limit,
            remaining,
            reset_at,
        }
    }

    /// Returns the maximum requests allowed in the current window.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.limit
    }

    /// Returns the remaining requests in the current window.
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Returns the Unix timestamp when the window resets.
    #[must_use]
    pub const fn reset_at(&self) -> u64 {
        self.reset_at
    }

    /// The reset time as a UTC timestamp, for display.
    #[must_use]
    pub fn reset_at_utc(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.reset_at)
            .ok()
            .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
    }

    /// Returns true if the quota has been used up.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Seconds from `now` until the reset, or 0 if it already passed.
    #[must_use]
    pub const fn seconds_until_reset_from(&self, now: u64) -> u64 {
        self.reset_at.saturating_sub(now)
    }
}

/// Reads the current quota for a category.
#[cfg_attr(test, mockall::automock)]
pub trait RateLimitProbe {
    /// Fetches the live quota for `category` (usually [`CORE_CATEGORY`]).
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Network`] when the quota endpoint is
    /// unreachable, [`HarvestError::Api`] for a non-200 answer and
    /// [`HarvestError::MalformedPayload`] when the category is missing.
    fn status(&self, category: &str) -> Result<RateLimitInfo, HarvestError>;
}

#[derive(Debug, Deserialize)]
struct RateLimitResponse {
    resources: HashMap<String, RateLimitInfo>,
}

/// Probe that queries `{api_base}/rate_limit` through a [`Transport`].
pub struct HttpRateLimitProbe<'a> {
    transport: &'a dyn Transport,
    url: Url,
    timeout: Duration,
}

impl<'a> HttpRateLimitProbe<'a> {
    /// Creates a probe for the given API base.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Configuration`] when the quota URL cannot be
    /// derived from `api_base`.
    pub fn new(
        transport: &'a dyn Transport,
        api_base: &Url,
        timeout: Duration,
    ) -> Result<Self, HarvestError> {
        let url = join_api_path(api_base, "rate_limit")?;
        Ok(Self {
            transport,
            url,
            timeout,
        })
    }

    /// Remaining calls in `category`.
    ///
    /// # Errors
    ///
    /// Propagates failures from [`RateLimitProbe::status`].
    pub fn remaining(&self, category: &str) -> Result<u64, HarvestError> {
        self.status(category).map(|info| info.remaining())
    }

    /// Reset time of `category` as Unix seconds.
    ///
    /// # Errors
    ///
    /// Propagates failures from [`RateLimitProbe::status`].
    pub fn reset_time(&self, category: &str) -> Result<u64, HarvestError> {
        self.status(category).map(|info| info.reset_at())
    }
}

impl RateLimitProbe for HttpRateLimitProbe<'_> {
    fn status(&self, category: &str) -> Result<RateLimitInfo, HarvestError> {
        let response = self
            .transport
            .get(self.url.as_str(), self.timeout)
            .map_err(|error| HarvestError::Network {
                message: format!("rate limit query failed: {error}"),
            })?;

        if !response.is_ok() {
            return Err(HarvestError::Api {
                message: format!("rate limit query returned status {}", response.status),
            });
        }

        let parsed: RateLimitResponse =
            serde_json::from_str(&response.body).map_err(|error| {
                HarvestError::MalformedPayload {
                    url: response.url.clone(),
                    message: error.to_string(),
                }
            })?;

        parsed
            .resources
            .get(category)
            .copied()
            .ok_or_else(|| HarvestError::MalformedPayload {
                url: response.url.clone(),
                message: format!("rate limit category '{category}' missing"),
            })
    }
}

/// Appends `path` to the API base, preserving any enterprise prefix.
pub(crate) fn join_api_path(api_base: &Url, path: &str) -> Result<Url, HarvestError> {
    let mut url = api_base.clone();
    url.path_segments_mut()
        .map_err(|()| HarvestError::Configuration {
            message: format!("API base '{api_base}' cannot carry a path"),
        })?
        .pop_if_empty()
        .push(path);
    Ok(url)
}
