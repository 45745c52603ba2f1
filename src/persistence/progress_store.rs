//! Durable per-repository, per-endpoint harvesting counters.
//!
//! The backing file is a JSON object keyed by `{owner}_{repo}`; each value
//! maps `{resourceKey}`, `{resourceKey}_last_page_number` and
//! `{resourceKey}_curr_page_number` to integers:
//!
//! ```json
//! {
//!     "octo_repo": {
//!         "issues": 250,
//!         "issues_curr_page_number": 3,
//!         "issues_last_page_number": 3
//!     }
//! }
//! ```
//!
//! Every mutation is a full read-modify-write of that file, replaced
//! atomically. Only one process may use a given file at a time.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use tracing::{debug, info};

use super::atomic::{render_pretty, write_atomic};
use super::error::PersistenceError;
use crate::github::{EndpointSpec, RepositoryTarget};

const LAST_PAGE_SUFFIX: &str = "_last_page_number";
const CURRENT_PAGE_SUFFIX: &str = "_curr_page_number";

type ProgressMap = BTreeMap<String, BTreeMap<String, u64>>;

/// Counters for one repository endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressRecord {
    /// Items persisted so far. Never decreases.
    pub accumulated_items: u64,
    /// Total pages GitHub advertised at the last update.
    pub last_page_number: u32,
    /// Highest page persisted, bounded by `last_page_number`.
    pub current_page_number: u32,
}

/// File-backed progress store.
#[derive(Debug)]
pub struct ProgressStore {
    dir: Dir,
    file_name: String,
    path: Utf8PathBuf,
}

impl ProgressStore {
    /// Opens the store at `path`, creating an empty one when absent.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Io`] when the file or its directory cannot
    /// be accessed and [`PersistenceError::Corrupt`] when an existing file is
    /// not a valid progress map. A corrupt file is never reset.
    pub fn open(path: &Utf8Path) -> Result<Self, PersistenceError> {
        let file_name = path
            .file_name()
            .ok_or_else(|| PersistenceError::Io {
                operation: "open progress file",
                path: path.to_string(),
                message: "path has no file name".to_owned(),
            })?
            .to_owned();
        let parent = match path.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent,
            _ => Utf8Path::new("."),
        };

        let dir = Dir::create_ambient_dir_all(parent, ambient_authority())
            .and_then(|()| Dir::open_ambient_dir(parent, ambient_authority()))
            .map_err(|error| {
                PersistenceError::io("open progress directory", parent.as_str(), &error)
            })?;

        let store = Self {
            dir,
            file_name,
            path: path.to_path_buf(),
        };

        if store.dir.exists(&store.file_name) {
            store.load()?;
        } else {
            store.save(&ProgressMap::new())?;
            info!(path = %store.path, "created progress file");
        }
        Ok(store)
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        self.path.as_path()
    }

    /// Registers `target` with zeroed counters for every endpoint that has
    /// none yet. Existing counters are left untouched.
    ///
    /// # Errors
    ///
    /// Propagates read, corruption and write failures.
    pub fn ensure_defaults(
        &self,
        target: &RepositoryTarget,
        endpoints: &[EndpointSpec],
    ) -> Result<(), PersistenceError> {
        let mut map = self.load()?;
        let entry = map.entry(target.key()).or_default();

        let mut changed = false;
        for endpoint in endpoints {
            let key = endpoint.resource_key();
            for field in [
                key.clone(),
                format!("{key}{LAST_PAGE_SUFFIX}"),
                format!("{key}{CURRENT_PAGE_SUFFIX}"),
            ] {
                if let Entry::Vacant(slot) = entry.entry(field) {
                    slot.insert(0);
                    changed = true;
                }
            }
        }

        if changed {
            debug!(repository = %target, "registered default progress counters");
            self.save(&map)?;
        }
        Ok(())
    }

    /// Reads the counters for one endpoint. Absent keys read as zero.
    ///
    /// # Errors
    ///
    /// Propagates read and corruption failures.
    pub fn get(
        &self,
        target: &RepositoryTarget,
        resource_key: &str,
    ) -> Result<ProgressRecord, PersistenceError> {
        let map = self.load()?;
        Ok(map
            .get(&target.key())
            .map(|entry| record_from(entry, resource_key))
            .unwrap_or_default())
    }

    /// Records a persisted page.
    ///
    /// Adds `items_added` to the item count, stores `last_page` and moves the
    /// page pointer to `current_page`. The pointer never moves backwards and
    /// never exceeds `last_page`, so re-fetching an early page while filling
    /// a gap keeps the highest page already recorded.
    ///
    /// # Errors
    ///
    /// Propagates read, corruption and write failures.
    pub fn apply_page_result(
        &self,
        target: &RepositoryTarget,
        resource_key: &str,
        current_page: u32,
        last_page: u32,
        items_added: u64,
    ) -> Result<ProgressRecord, PersistenceError> {
        let mut map = self.load()?;
        let entry = map.entry(target.key()).or_default();
        let previous = record_from(entry, resource_key);

        let updated = ProgressRecord {
            accumulated_items: previous.accumulated_items.saturating_add(items_added),
            last_page_number: last_page,
            current_page_number: previous
                .current_page_number
                .max(current_page)
                .min(last_page),
        };

        entry.insert(resource_key.to_owned(), updated.accumulated_items);
        entry.insert(
            format!("{resource_key}{LAST_PAGE_SUFFIX}"),
            u64::from(updated.last_page_number),
        );
        entry.insert(
            format!("{resource_key}{CURRENT_PAGE_SUFFIX}"),
            u64::from(updated.current_page_number),
        );

        self.save(&map)?;
        Ok(updated)
    }

    fn load(&self) -> Result<ProgressMap, PersistenceError> {
        let raw = self.dir.read_to_string(&self.file_name).map_err(|error| {
            PersistenceError::io("read progress file", self.path.as_str(), &error)
        })?;
        serde_json::from_str(&raw).map_err(|error| PersistenceError::Corrupt {
            path: self.path.to_string(),
            message: error.to_string(),
        })
    }

    fn save(&self, map: &ProgressMap) -> Result<(), PersistenceError> {
        let rendered = render_pretty(map).map_err(|error| PersistenceError::Serialise {
            path: self.path.to_string(),
            message: error.to_string(),
        })?;

        write_atomic(&self.dir, &self.file_name, &rendered).map_err(|error| {
            PersistenceError::io("write progress file", self.path.as_str(), &error)
        })
    }
}

fn record_from(entry: &BTreeMap<String, u64>, resource_key: &str) -> ProgressRecord {
    let page = |suffix: &str| {
        entry
            .get(&format!("{resource_key}{suffix}"))
            .map_or(0, |value| u32::try_from(*value).unwrap_or(u32::MAX))
    };
    ProgressRecord {
        accumulated_items: entry.get(resource_key).copied().unwrap_or(0),
        last_page_number: page(LAST_PAGE_SUFFIX),
        current_page_number: page(CURRENT_PAGE_SUFFIX),
    }
}

#[cfg(test)]
#[path = "progress_store_tests.rs"]
mod tests;
