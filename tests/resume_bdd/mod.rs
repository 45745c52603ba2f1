//! Support modules for the resume BDD tests.

#[path = "../support/mod.rs"]
mod shared;
pub(crate) mod state;

pub(crate) use shared::github_mocks;
pub(crate) use shared::runtime;
pub(crate) use shared::{create_temp_dir, read_page, run_harvest, test_config, utf8_root};
pub(crate) use state::{
    REPOSITORY, ResumeState, ensure_runtime_and_server, harvest, page_store, progress_store,
    read_progress, server_uri, summary, target, workspace,
};
