use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::Notify;
use treemirror::watch::source::{BatchFuture, EventBatch, EventSource};
use treemirror::watch::{EventFlags, RawEvent};

#[derive(Debug, Default)]
struct FakeState {
    next: u32,
    /// Currently watched paths and their handles.
    active: HashMap<PathBuf, u32>,
    /// Every successful `add_watch` for a path not yet watched, in order.
    added: Vec<PathBuf>,
    removed: Vec<u32>,
    denied: HashSet<PathBuf>,
    kernel_limit: Option<usize>,
    /// Directory trees deleted from disk as soon as the key path is watched.
    remove_on_watch: HashMap<PathBuf, PathBuf>,
    script: VecDeque<io::Result<EventBatch<u32>>>,
}

/// A scripted in-memory event source.
///
/// - `add_watch` hands out increasing `u32` handles; the same path keeps its
///   handle while watched.
/// - `next_batch` yields pushed batches in order and otherwise waits until
///   another one is pushed.
///
/// Clones share state, so a test keeps one clone for assertions.
#[derive(Debug, Clone, Default)]
pub struct FakeSource {
    state: Arc<Mutex<FakeState>>,
    wakeup: Arc<Notify>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject `add_watch` with `StorageFull` once `limit` watches are active.
    pub fn with_kernel_limit(self, limit: usize) -> Self {
        self.lock().kernel_limit = Some(limit);
        self
    }

    /// Reject `add_watch(path)` with permission denied.
    pub fn deny(&self, path: impl Into<PathBuf>) {
        self.lock().denied.insert(path.into());
    }

    /// Delete `victim` from disk right after `trigger` is watched, so a walk
    /// in progress trips over an entry it has already listed.
    pub fn remove_when_watched(&self, trigger: impl Into<PathBuf>, victim: impl Into<PathBuf>) {
        self.lock()
            .remove_on_watch
            .insert(trigger.into(), victim.into());
    }

    /// Handle of a currently watched path.
    pub fn handle_for(&self, path: impl AsRef<Path>) -> Option<u32> {
        self.lock().active.get(path.as_ref()).copied()
    }

    pub fn push_batch(&self, batch: EventBatch<u32>) {
        self.lock().script.push_back(Ok(batch));
        self.wakeup.notify_one();
    }

    /// Make the next read fail.
    pub fn push_error(&self, kind: io::ErrorKind) {
        self.lock().script.push_back(Err(io::Error::from(kind)));
        self.wakeup.notify_one();
    }

    /// Simulate the kernel dropping the watch on `path` (directory deleted):
    /// deactivate it and queue the corresponding removal record.
    pub fn drop_watch(&self, path: impl AsRef<Path>) -> Option<u32> {
        let handle = self.lock().active.remove(path.as_ref())?;
        self.push_batch(vec![RawEvent::bare(handle, EventFlags::WATCH_REMOVED)]);
        Some(handle)
    }

    pub fn added_paths(&self) -> Vec<PathBuf> {
        self.lock().added.clone()
    }

    pub fn active_count(&self) -> usize {
        self.lock().active.len()
    }

    pub fn removed_handles(&self) -> Vec<u32> {
        self.lock().removed.clone()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl EventSource for FakeSource {
    type Handle = u32;

    fn add_watch(&mut self, path: &Path) -> io::Result<u32> {
        let mut state = self.lock();
        if state.denied.contains(path) {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }
        if let Some(handle) = state.active.get(path) {
            return Ok(*handle);
        }
        if state
            .kernel_limit
            .is_some_and(|limit| state.active.len() >= limit)
        {
            return Err(io::Error::from(io::ErrorKind::StorageFull));
        }

        state.next += 1;
        let handle = state.next;
        state.active.insert(path.to_path_buf(), handle);
        state.added.push(path.to_path_buf());
        if let Some(victim) = state.remove_on_watch.get(path) {
            let _ = std::fs::remove_dir_all(victim);
        }
        Ok(handle)
    }

    fn remove_watch(&mut self, handle: &u32) -> io::Result<()> {
        let mut state = self.lock();
        let before = state.active.len();
        state.active.retain(|_, h| *h != *handle);
        if state.active.len() == before {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("no active watch with handle {handle}"),
            ));
        }
        state.removed.push(*handle);
        Ok(())
    }

    fn next_batch(&mut self) -> BatchFuture<'_, u32> {
        let state = Arc::clone(&self.state);
        let wakeup = Arc::clone(&self.wakeup);
        Box::pin(async move {
            loop {
                let next = state
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .script
                    .pop_front();
                if let Some(next) = next {
                    return next;
                }
                wakeup.notified().await;
            }
        })
    }
}
