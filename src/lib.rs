//! Hoarder library crate: a resumable GitHub resource harvester.
//!
//! For each configured repository the harvester pages through issues, pull
//! requests, commit comments, commits and pull request review comments,
//! writing every page to disk as sorted, pretty-printed JSON. Each issue's
//! comments and events are gathered into companion files. A progress file
//! records how far each endpoint got so an interrupted or rate-limited run
//! picks up at the first page that is not yet on disk.

pub mod config;
pub mod github;
pub mod ingest;
pub mod persistence;
pub mod telemetry;

pub use config::HoarderConfig;
pub use github::{
    EndpointSpec, HarvestError, HttpRateLimitProbe, PersonalAccessToken, RepositoryTarget,
    RequestExecutor, ReqwestTransport, RetryPolicy, SystemClock,
};
pub use ingest::{
    HarvestSettings, HarvestSummary, IngestionOrchestrator, SecondaryFetcher, run_harvest,
};
pub use persistence::{PageStore, ProgressStore};
