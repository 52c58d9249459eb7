// src/watch/walker.rs

//! Recursive watch installation.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::errors::{RegistryError, WalkError};
use crate::watch::filter::ExclusionFilter;
use crate::watch::registry::WatchRegistry;
use crate::watch::source::EventSource;

/// Upper bound on directory handles held open by one walk.
pub const MAX_OPEN_DIRS: usize = 16;

/// What a single [`DirectoryWalker::install`] call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    /// Directories newly added to (or refreshed in) the registry.
    pub installed: usize,
    /// Excluded directories whose subtree was pruned.
    pub excluded: usize,
    /// Entries that could not be read or watched.
    pub skipped: usize,
    /// The walk stopped early because the registry ran out of capacity.
    pub exhausted: bool,
}

/// Installs watches on a directory and every non-excluded directory below it.
///
/// Traversal is pre-order and depth-first, does not follow symlinks, and
/// returns only once the whole subtree has been handled. Unreadable entries
/// below the root are logged and left out of the watch set.
#[derive(Debug, Clone, Copy)]
pub struct DirectoryWalker<'a> {
    filter: &'a ExclusionFilter,
}

impl<'a> DirectoryWalker<'a> {
    pub fn new(filter: &'a ExclusionFilter) -> Self {
        Self { filter }
    }

    pub fn install<S: EventSource>(
        &self,
        registry: &mut WatchRegistry<S>,
        root: &Path,
    ) -> Result<WalkSummary, WalkError> {
        let mut summary = WalkSummary::default();

        if self.filter.is_excluded(root) {
            info!("skipping excluded path: {}", root.display());
            summary.excluded += 1;
            return Ok(summary);
        }

        ensure_traversable(root)?;

        let filter = self.filter;
        let mut excluded = 0;
        let walker = WalkDir::new(root)
            .follow_links(false)
            .max_open(MAX_OPEN_DIRS)
            .into_iter()
            .filter_entry(|entry| {
                if !entry.file_type().is_dir() || !filter.is_excluded(entry.path()) {
                    return true;
                }
                info!("skipping excluded path: {}", entry.path().display());
                excluded += 1;
                false
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(
                        path = ?err.path(),
                        error = %err,
                        "skipping unreadable entry"
                    );
                    summary.skipped += 1;
                    continue;
                }
            };

            if !entry.file_type().is_dir() {
                continue;
            }

            match registry.add(entry.path()) {
                Ok(_) => summary.installed += 1,
                Err(err @ RegistryError::Full { .. }) => {
                    warn!("{err}");
                    summary.exhausted = true;
                    break;
                }
                Err(err @ RegistryError::Watch { .. }) => {
                    warn!("{err}");
                    summary.skipped += 1;
                }
            }
        }

        summary.excluded += excluded;
        Ok(summary)
    }
}

/// The root itself must be a directory we can list.
fn ensure_traversable(root: &Path) -> Result<(), WalkError> {
    let root_error = |source: io::Error| WalkError::Root {
        path: root.to_path_buf(),
        source,
    };

    let meta = fs::symlink_metadata(root).map_err(root_error)?;
    if !meta.is_dir() {
        return Err(root_error(io::Error::new(
            io::ErrorKind::NotADirectory,
            "not a directory",
        )));
    }
    fs::read_dir(root).map_err(root_error)?;
    Ok(())
}
