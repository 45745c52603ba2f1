//! GitHub REST plumbing: identities, endpoints, transport, quota and
//! pagination.
//!
//! Everything here is blocking and single-threaded. The [`Transport`],
//! [`Clock`] and [`RateLimitProbe`] traits are the seams that let tests
//! script network behaviour and time without touching the real API.

pub mod auth;
pub mod clock;
pub mod endpoint;
pub mod error;
pub mod executor;
pub mod locator;
pub mod pagination;
pub mod rate_limit;
pub mod transport;

pub use auth::validate_token;
pub use clock::{Clock, SystemClock};
pub use endpoint::{Category, EndpointSpec, PER_PAGE, Resource};
pub use error::HarvestError;
pub use executor::{RequestExecutor, RetryPolicy};
pub use locator::{PersonalAccessToken, RepositoryName, RepositoryOwner, RepositoryTarget};
pub use pagination::last_page;
pub use rate_limit::{CORE_CATEGORY, HttpRateLimitProbe, RateLimitInfo, RateLimitProbe};
pub use transport::{ApiResponse, ReqwestTransport, Transport, TransportError};

#[cfg(test)]
mod tests;
