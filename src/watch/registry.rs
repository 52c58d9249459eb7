// src/watch/registry.rs

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::errors::RegistryError;
use crate::watch::source::EventSource;

/// Default upper bound on simultaneously active watches.
pub const DEFAULT_MAX_WATCHES: usize = 524_288;

/// Live mapping between watch handles and the directories they observe.
///
/// The registry owns the event source: installing a watch and recording its
/// path happen in one place, so every handle the source knows about has
/// exactly one entry here. Storage grows on demand; `capacity` is a ceiling,
/// not a preallocation. The kernel may run out of watches before that
/// ceiling is reached, which is reported the same way.
pub struct WatchRegistry<S: EventSource> {
    source: S,
    entries: HashMap<S::Handle, PathBuf>,
    capacity: usize,
}

impl<S: EventSource> std::fmt::Debug for WatchRegistry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchRegistry")
            .field("size", &self.entries.len())
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl<S: EventSource> WatchRegistry<S> {
    pub fn new(source: S) -> Self {
        Self::with_capacity(source, DEFAULT_MAX_WATCHES)
    }

    pub fn with_capacity(source: S, capacity: usize) -> Self {
        Self {
            source,
            entries: HashMap::new(),
            capacity,
        }
    }

    /// Install a watch on `path` and remember it.
    ///
    /// Callers are responsible for not passing excluded paths. At capacity,
    /// only directories that are already watched (same inode, for example
    /// after a rename inside the tree) are accepted; their entry is updated.
    pub fn add(&mut self, path: &Path) -> Result<S::Handle, RegistryError> {
        let handle = match self.source.add_watch(path) {
            Ok(handle) => handle,
            Err(err) if err.kind() == io::ErrorKind::StorageFull => {
                return Err(RegistryError::Full {
                    path: path.to_path_buf(),
                    capacity: self.entries.len(),
                });
            }
            Err(source) => {
                return Err(RegistryError::Watch {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        if let Some(previous) = self.entries.get_mut(&handle) {
            // Same inode watched twice: the source handed back the existing
            // handle, so the entry is replaced rather than duplicated.
            if previous.as_path() != path {
                debug!(?handle, ?previous, ?path, "watch handle reused for new path");
                *previous = path.to_path_buf();
            }
            return Ok(handle);
        }

        if self.entries.len() >= self.capacity {
            if let Err(err) = self.source.remove_watch(&handle) {
                debug!(?handle, ?path, error = %err, "failed to undo watch over capacity");
            }
            return Err(RegistryError::Full {
                path: path.to_path_buf(),
                capacity: self.capacity,
            });
        }

        self.entries.insert(handle.clone(), path.to_path_buf());
        info!("watching: {}", path.display());
        Ok(handle)
    }

    pub fn lookup(&self, handle: &S::Handle) -> Option<&Path> {
        self.entries.get(handle).map(PathBuf::as_path)
    }

    /// Drop an entry whose watch the source has already released.
    pub fn forget(&mut self, handle: &S::Handle) -> Option<PathBuf> {
        self.entries.remove(handle)
    }

    /// Remove the watches on `path` and on every directory recorded below it.
    ///
    /// Used when a watched directory was renamed: entries under its old path
    /// no longer describe where those directories are. Returns how many
    /// entries were released.
    pub fn release_subtree(&mut self, path: &Path) -> usize {
        let stale: Vec<S::Handle> = self
            .entries
            .iter()
            .filter(|(_, p)| p.starts_with(path))
            .map(|(handle, _)| handle.clone())
            .collect();

        for handle in &stale {
            if let Some(old) = self.entries.remove(handle) {
                if let Err(err) = self.source.remove_watch(handle) {
                    debug!(?handle, path = ?old, error = %err, "failed to remove watch");
                }
            }
        }
        stale.len()
    }

    /// Remove every watch from the source and clear the registry.
    ///
    /// Returns how many entries were released.
    pub fn release_all(&mut self) -> usize {
        let released = self.entries.len();
        for (handle, path) in self.entries.drain() {
            // Watches on deleted directories are already gone.
            if let Err(err) = self.source.remove_watch(&handle) {
                debug!(?handle, ?path, error = %err, "failed to remove watch");
            }
        }
        released
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.values().map(PathBuf::as_path)
    }

    pub fn contains_path(&self, path: &Path) -> bool {
        self.entries.values().any(|p| p == path)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::io;
    use std::path::{Path, PathBuf};

    use super::*;
    use crate::watch::source::{BatchFuture, EventBatch, EventSource};

    /// Minimal in-crate source; richer fakes live in the test-utils crate.
    #[derive(Default)]
    struct CountingSource {
        next: u32,
        by_path: HashMap<PathBuf, u32>,
        removed: Vec<u32>,
        kernel_limit: Option<usize>,
        denied: HashSet<PathBuf>,
    }

    impl EventSource for CountingSource {
        type Handle = u32;

        fn add_watch(&mut self, path: &Path) -> io::Result<u32> {
            if self.denied.contains(path) {
                return Err(io::Error::from(io::ErrorKind::PermissionDenied));
            }
            if let Some(handle) = self.by_path.get(path) {
                return Ok(*handle);
            }
            if self.kernel_limit.is_some_and(|limit| self.by_path.len() >= limit) {
                return Err(io::Error::from(io::ErrorKind::StorageFull));
            }
            self.next += 1;
            self.by_path.insert(path.to_path_buf(), self.next);
            Ok(self.next)
        }

        fn remove_watch(&mut self, handle: &u32) -> io::Result<()> {
            self.removed.push(*handle);
            Ok(())
        }

        fn next_batch(&mut self) -> BatchFuture<'_, u32> {
            Box::pin(std::future::pending::<io::Result<EventBatch<u32>>>())
        }
    }

    #[test]
    fn added_paths_resolve_back_through_lookup() {
        let mut registry = WatchRegistry::new(CountingSource::default());
        let a = registry.add(Path::new("/data")).unwrap();
        let b = registry.add(Path::new("/data/a")).unwrap();

        assert_ne!(a, b);
        assert_eq!(registry.size(), 2);
        assert_eq!(registry.lookup(&a), Some(Path::new("/data")));
        assert_eq!(registry.lookup(&b), Some(Path::new("/data/a")));
    }

    #[test]
    fn lookup_of_unknown_handle_is_none_and_side_effect_free() {
        let mut registry = WatchRegistry::new(CountingSource::default());
        registry.add(Path::new("/data")).unwrap();

        assert_eq!(registry.lookup(&999), None);
        assert_eq!(registry.size(), 1);
    }

    #[test]
    fn re_adding_the_same_directory_does_not_grow_the_registry() {
        let mut registry = WatchRegistry::new(CountingSource::default());
        let first = registry.add(Path::new("/data")).unwrap();
        let second = registry.add(Path::new("/data")).unwrap();

        assert_eq!(first, second);
        assert_eq!(registry.size(), 1);
    }

    #[test]
    fn add_at_capacity_is_full_and_leaves_size_unchanged() {
        let mut registry = WatchRegistry::with_capacity(CountingSource::default(), 2);
        registry.add(Path::new("/a")).unwrap();
        registry.add(Path::new("/b")).unwrap();
        assert!(registry.is_full());

        let err = registry.add(Path::new("/c")).unwrap_err();
        assert!(matches!(err, RegistryError::Full { capacity: 2, .. }));
        assert_eq!(registry.size(), 2);
        // The watch installed for /c was taken back.
        assert_eq!(registry.source().removed, vec![3]);
    }

    #[test]
    fn renamed_directory_is_accepted_at_capacity() {
        let mut registry = WatchRegistry::with_capacity(CountingSource::default(), 2);
        let old = registry.add(Path::new("/data/old")).unwrap();
        registry.add(Path::new("/data/other")).unwrap();

        // Same inode under a new name.
        let by_path = &mut registry.source_mut().by_path;
        let handle = by_path.remove(Path::new("/data/old")).unwrap();
        by_path.insert(PathBuf::from("/data/new"), handle);

        let renamed = registry.add(Path::new("/data/new")).unwrap();
        assert_eq!(renamed, old);
        assert_eq!(registry.size(), 2);
        assert_eq!(registry.lookup(&old), Some(Path::new("/data/new")));
        assert!(registry.source().removed.is_empty());
    }

    #[test]
    fn release_subtree_drops_the_directory_and_its_descendants() {
        let mut registry = WatchRegistry::new(CountingSource::default());
        registry.add(Path::new("/data/a")).unwrap();
        registry.add(Path::new("/data/a/b")).unwrap();
        registry.add(Path::new("/data/a/b/c")).unwrap();
        let sibling = registry.add(Path::new("/data/ab")).unwrap();

        assert_eq!(registry.release_subtree(Path::new("/data/a")), 3);
        assert_eq!(registry.size(), 1);
        assert_eq!(registry.lookup(&sibling), Some(Path::new("/data/ab")));
        assert_eq!(registry.source().removed.len(), 3);
    }

    #[test]
    fn kernel_watch_exhaustion_maps_to_full() {
        let source = CountingSource {
            kernel_limit: Some(1),
            ..Default::default()
        };
        let mut registry = WatchRegistry::with_capacity(source, 100);
        registry.add(Path::new("/a")).unwrap();

        let err = registry.add(Path::new("/b")).unwrap_err();
        assert!(matches!(err, RegistryError::Full { .. }));
        assert_eq!(registry.size(), 1);
    }

    #[test]
    fn other_source_failures_are_watch_errors() {
        let mut source = CountingSource::default();
        source.denied.insert(PathBuf::from("/secret"));
        let mut registry = WatchRegistry::new(source);

        let err = registry.add(Path::new("/secret")).unwrap_err();
        match err {
            RegistryError::Watch { path, source } => {
                assert_eq!(path, Path::new("/secret"));
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
            other => panic!("expected Watch error, got {other:?}"),
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn forget_and_release_all() {
        let mut registry = WatchRegistry::new(CountingSource::default());
        let a = registry.add(Path::new("/a")).unwrap();
        registry.add(Path::new("/b")).unwrap();
        registry.add(Path::new("/c")).unwrap();

        assert_eq!(registry.forget(&a), Some(PathBuf::from("/a")));
        assert_eq!(registry.lookup(&a), None);
        assert!(!registry.contains_path(Path::new("/a")));

        assert_eq!(registry.release_all(), 2);
        assert!(registry.is_empty());
        let mut removed = registry.source().removed.clone();
        removed.sort();
        assert_eq!(removed, vec![2, 3]);
    }
}
