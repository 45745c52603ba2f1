//! The harvesting core: resume planning, per-issue lookups and the
//! orchestrator that ties them to the GitHub and persistence layers.

pub mod orchestrator;
pub mod resume;
pub mod run;
pub mod secondary;
pub mod settings;

pub use orchestrator::{HarvestSummary, IngestionOrchestrator};
pub use resume::{ResumePlan, ResumePlanner};
pub use run::run_harvest;
pub use secondary::{IssueActivity, SecondaryFetcher};
pub use settings::HarvestSettings;
