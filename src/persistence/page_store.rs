//! Page files on disk.
//!
//! Layout under the data root:
//! `{owner}_{repo}/{resourceKey}/{owner}_{repo}_{resourceKey}_page_{n}.json`.
//! Payloads are pretty-printed with four-space indentation and sorted object
//! keys so that re-fetching unchanged data produces byte-identical files.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use serde_json::{Map, Value};

use super::atomic::{render_pretty, write_atomic};
use super::error::PersistenceError;
use crate::github::{EndpointSpec, RepositoryTarget};

/// Directory capability holding every harvested page.
#[derive(Debug)]
pub struct PageStore {
    root: Dir,
    root_path: Utf8PathBuf,
}

impl PageStore {
    /// Opens (and creates, if needed) the data root.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Io`] when the directory cannot be created
    /// or opened.
    pub fn open(root_path: &Utf8Path) -> Result<Self, PersistenceError> {
        let root = Dir::create_ambient_dir_all(root_path, ambient_authority())
            .and_then(|()| Dir::open_ambient_dir(root_path, ambient_authority()))
            .map_err(|error| {
                PersistenceError::io("open data directory", root_path.as_str(), &error)
            })?;
        Ok(Self {
            root,
            root_path: root_path.to_path_buf(),
        })
    }

    /// Path of a page file relative to the data root.
    #[must_use]
    pub fn relative_path(
        target: &RepositoryTarget,
        endpoint: &EndpointSpec,
        page: u32,
    ) -> Utf8PathBuf {
        let repository = target.key();
        let resource = endpoint.resource_key();
        Utf8PathBuf::from(format!("{repository}/{resource}"))
            .join(format!("{repository}_{resource}_page_{page}.json"))
    }

    /// Absolute (root-prefixed) path of a page file, for diagnostics.
    #[must_use]
    pub fn display_path(
        &self,
        target: &RepositoryTarget,
        endpoint: &EndpointSpec,
        page: u32,
    ) -> Utf8PathBuf {
        self.root_path
            .join(Self::relative_path(target, endpoint, page))
    }

    /// Whether the page file is present.
    #[must_use]
    pub fn page_exists(
        &self,
        target: &RepositoryTarget,
        endpoint: &EndpointSpec,
        page: u32,
    ) -> bool {
        self.root
            .exists(Self::relative_path(target, endpoint, page))
    }

    /// Writes (or overwrites) one page atomically.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Io`] when the directory or file cannot be
    /// written and [`PersistenceError::Serialise`] when rendering fails.
    pub fn write_page(
        &self,
        target: &RepositoryTarget,
        endpoint: &EndpointSpec,
        page: u32,
        payload: &Value,
    ) -> Result<Utf8PathBuf, PersistenceError> {
        let relative = Self::relative_path(target, endpoint, page);
        let display = self.display_path(target, endpoint, page);
        let (Some(parent), Some(file_name)) = (relative.parent(), relative.file_name()) else {
            return Err(PersistenceError::Io {
                operation: "resolve page path",
                path: display.to_string(),
                message: "page path has no parent directory".to_owned(),
            });
        };

        self.root.create_dir_all(parent).map_err(|error| {
            PersistenceError::io("create page directory", display.as_str(), &error)
        })?;
        let dir = self.root.open_dir(parent).map_err(|error| {
            PersistenceError::io("open page directory", display.as_str(), &error)
        })?;

        let sorted = sort_keys(payload.clone());
        let rendered = render_pretty(&sorted).map_err(|error| PersistenceError::Serialise {
            path: display.to_string(),
            message: error.to_string(),
        })?;
        write_atomic(&dir, file_name, &rendered)
            .map_err(|error| PersistenceError::io("write page", display.as_str(), &error))?;
        Ok(display)
    }

    /// Reads a page back.
    #[cfg(test)]
    pub(crate) fn read_page(
        &self,
        target: &RepositoryTarget,
        endpoint: &EndpointSpec,
        page: u32,
    ) -> Result<Value, PersistenceError> {
        let relative = Self::relative_path(target, endpoint, page);
        let display = self.display_path(target, endpoint, page);
        let raw = self
            .root
            .read_to_string(&relative)
            .map_err(|error| PersistenceError::io("read page", display.as_str(), &error))?;
        serde_json::from_str(&raw).map_err(|error| PersistenceError::Corrupt {
            path: display.to_string(),
            message: error.to_string(),
        })
    }
}

/// `Map` iterates in key order only while serde_json's `preserve_order`
/// feature is off, and any crate in the graph can switch it on.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|left, right| left.0.cmp(&right.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, inner)| (key, sort_keys(inner)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
