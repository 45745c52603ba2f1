//! Scenario state and runtime/server initialisation for the resume BDD tests.

use camino::Utf8PathBuf;
use hoarder::{HarvestError, HarvestSummary, PageStore, ProgressStore, RepositoryTarget};
use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;
use serde_json::Value;
use tempfile::TempDir;
use wiremock::MockServer;

use super::runtime::SharedRuntime;
use super::{create_temp_dir, run_harvest, test_config, utf8_root};

pub(crate) const REPOSITORY: &str = "octo/repo";

#[derive(ScenarioState, Default)]
pub(crate) struct ResumeState {
    pub(crate) runtime: Slot<SharedRuntime>,
    pub(crate) server: Slot<MockServer>,
    pub(crate) temp_dir: Slot<TempDir>,
    pub(crate) workspace: Slot<Utf8PathBuf>,
    pub(crate) summaries: Slot<Vec<HarvestSummary>>,
    pub(crate) progress_snapshots: Slot<Vec<Value>>,
    pub(crate) error: Slot<HarvestError>,
}

/// Ensures the runtime, server and scratch workspace exist.
pub(crate) fn ensure_runtime_and_server(resume_state: &ResumeState) -> SharedRuntime {
    if resume_state.runtime.with_ref(|_| ()).is_none() {
        let runtime = SharedRuntime::start()
            .unwrap_or_else(|error| panic!("failed to create Tokio runtime: {error}"));
        resume_state.runtime.set(runtime);
    }

    let shared_runtime = resume_state
        .runtime
        .get()
        .unwrap_or_else(|| panic!("runtime not initialised after set"));

    if resume_state.server.with_ref(|_| ()).is_none() {
        resume_state
            .server
            .set(shared_runtime.block_on(MockServer::start()));
    }

    if resume_state.workspace.with_ref(|_| ()).is_none() {
        let temp_dir = create_temp_dir();
        resume_state.workspace.set(utf8_root(&temp_dir));
        resume_state.temp_dir.set(temp_dir);
    }

    shared_runtime
}

pub(crate) fn server_uri(resume_state: &ResumeState) -> String {
    resume_state
        .server
        .with_ref(MockServer::uri)
        .unwrap_or_else(|| panic!("mock server not initialised"))
}

pub(crate) fn workspace(resume_state: &ResumeState) -> Utf8PathBuf {
    ensure_runtime_and_server(resume_state);
    resume_state
        .workspace
        .get()
        .unwrap_or_else(|| panic!("workspace not initialised"))
}

pub(crate) fn target() -> RepositoryTarget {
    RepositoryTarget::parse(REPOSITORY)
        .unwrap_or_else(|error| panic!("repository should parse: {error}"))
}

pub(crate) fn page_store(resume_state: &ResumeState) -> PageStore {
    PageStore::open(&workspace(resume_state).join("data"))
        .unwrap_or_else(|error| panic!("page store should open: {error}"))
}

pub(crate) fn progress_store(resume_state: &ResumeState) -> ProgressStore {
    ProgressStore::open(&workspace(resume_state).join("verification.json"))
        .unwrap_or_else(|error| panic!("progress store should open: {error}"))
}

pub(crate) fn read_progress(resume_state: &ResumeState) -> Value {
    let path = workspace(resume_state).join("verification.json");
    let raw = std::fs::read_to_string(&path)
        .unwrap_or_else(|error| panic!("failed to read {path}: {error}"));
    serde_json::from_str(&raw).unwrap_or_else(|error| panic!("progress should parse: {error}"))
}

/// Runs one harvest and records its outcome.
pub(crate) fn harvest(resume_state: &ResumeState) {
    let uri = server_uri(resume_state);
    let root = workspace(resume_state);
    match run_harvest(&test_config(&uri, &root, REPOSITORY)) {
        Ok(summary) => {
            let mut summaries = resume_state.summaries.take().unwrap_or_default();
            summaries.push(summary);
            resume_state.summaries.set(summaries);

            let mut snapshots = resume_state.progress_snapshots.take().unwrap_or_default();
            snapshots.push(read_progress(resume_state));
            resume_state.progress_snapshots.set(snapshots);
        }
        Err(error) => resume_state.error.set(error),
    }
}

/// Summary of the `run`-th successful harvest (1-based).
pub(crate) fn summary(resume_state: &ResumeState, run: usize) -> HarvestSummary {
    resume_state
        .summaries
        .with_ref(|summaries| summaries.get(run.saturating_sub(1)).copied())
        .flatten()
        .unwrap_or_else(|| panic!("harvest {run} did not succeed"))
}
