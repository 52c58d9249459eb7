// src/watch/notify_source.rs

//! Portable backend on top of the `notify` crate.
//!
//! `notify` reports absolute paths rather than per-watch records, so this
//! backend issues its own handles (one per non-recursively watched
//! directory) and maps each reported path back to `(parent handle, name)`.
//! That keeps the registry and the dispatch logic identical across backends.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::watch::source::{BatchFuture, EventBatch, EventFlags, EventSource, RawEvent};

/// Handle issued by [`NotifySource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotifyHandle(u64);

impl NotifyHandle {
    /// Never issued for a watch; used for records that belong to none.
    pub const UNTRACKED: NotifyHandle = NotifyHandle(0);
}

pub struct NotifySource {
    watcher: RecommendedWatcher,
    event_rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
    table: HandleTable,
}

impl std::fmt::Debug for NotifySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifySource")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl NotifySource {
    pub fn new() -> io::Result<Self> {
        // Channel from the blocking notify callback into the async world.
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                if let Err(err) = event_tx.send(res) {
                    // The tracing subscriber may already be gone here.
                    eprintln!("treemirror: failed to forward notify event: {err}");
                }
            },
            Config::default(),
        )
        .map_err(into_io_error)?;

        Ok(Self {
            watcher,
            event_rx,
            table: HandleTable::default(),
        })
    }
}

impl EventSource for NotifySource {
    type Handle = NotifyHandle;

    fn add_watch(&mut self, path: &Path) -> io::Result<NotifyHandle> {
        if let Some(handle) = self.table.handle_of(path) {
            return Ok(handle);
        }
        self.watcher
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(into_io_error)?;
        Ok(self.table.insert(path))
    }

    fn remove_watch(&mut self, handle: &NotifyHandle) -> io::Result<()> {
        let path = self
            .table
            .remove(handle)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "unknown watch handle"))?;
        self.watcher.unwatch(&path).map_err(into_io_error)
    }

    fn next_batch(&mut self) -> BatchFuture<'_, NotifyHandle> {
        Box::pin(async move {
            loop {
                let first = self.event_rx.recv().await.ok_or_else(|| {
                    io::Error::new(io::ErrorKind::BrokenPipe, "notify event channel closed")
                })?;

                let mut batch = EventBatch::new();
                self.table.decode(first, &mut batch);
                while let Ok(next) = self.event_rx.try_recv() {
                    self.table.decode(next, &mut batch);
                }

                if !batch.is_empty() {
                    return Ok(batch);
                }
            }
        })
    }
}

/// Bidirectional map between watched directories and their handles.
#[derive(Debug)]
struct HandleTable {
    by_path: HashMap<PathBuf, NotifyHandle>,
    by_handle: HashMap<NotifyHandle, PathBuf>,
    next: u64,
}

impl Default for HandleTable {
    fn default() -> Self {
        Self {
            by_path: HashMap::new(),
            by_handle: HashMap::new(),
            next: 1,
        }
    }
}

impl HandleTable {
    fn handle_of(&self, path: &Path) -> Option<NotifyHandle> {
        self.by_path.get(path).copied()
    }

    fn insert(&mut self, path: &Path) -> NotifyHandle {
        let handle = NotifyHandle(self.next);
        self.next += 1;
        self.by_path.insert(path.to_path_buf(), handle);
        self.by_handle.insert(handle, path.to_path_buf());
        handle
    }

    fn remove(&mut self, handle: &NotifyHandle) -> Option<PathBuf> {
        let path = self.by_handle.remove(handle)?;
        self.by_path.remove(&path);
        Some(path)
    }

    /// Translate one notify event into zero or more records.
    fn decode(&mut self, res: notify::Result<Event>, batch: &mut EventBatch<NotifyHandle>) {
        let event = match res {
            Ok(event) => event,
            Err(err) => {
                warn!(error = %err, "file watch error");
                return;
            }
        };

        if event.need_rescan() {
            batch.push(RawEvent::bare(NotifyHandle::UNTRACKED, EventFlags::OVERFLOW));
        }

        for path in &event.paths {
            match &event.kind {
                EventKind::Create(kind) => {
                    let is_dir = match kind {
                        CreateKind::Folder => true,
                        CreateKind::File => false,
                        _ => path.is_dir(),
                    };
                    let flags = EventFlags {
                        is_dir,
                        created: true,
                        ..EventFlags::default()
                    };
                    self.push_child(batch, path, flags);
                }
                EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                    self.push_moved_in(batch, path);
                }
                EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                    self.push_moved_away(batch, path);
                }
                // Platforms that cannot tell the two sides of a rename apart.
                EventKind::Modify(ModifyKind::Name(RenameMode::Any)) => {
                    if path.exists() {
                        self.push_moved_in(batch, path);
                    } else {
                        self.push_moved_away(batch, path);
                    }
                }
                EventKind::Remove(_) => {
                    if let Some(handle) = self.handle_of(path) {
                        self.remove(&handle);
                        batch.push(RawEvent::bare(handle, EventFlags::WATCH_REMOVED));
                    }
                }
                _ => {}
            }
        }
    }

    fn push_moved_in(&self, batch: &mut EventBatch<NotifyHandle>, path: &Path) {
        let flags = EventFlags {
            is_dir: path.is_dir(),
            moved_in: true,
            ..EventFlags::default()
        };
        self.push_child(batch, path, flags);
    }

    /// A watched directory was renamed away from its recorded path.
    fn push_moved_away(&self, batch: &mut EventBatch<NotifyHandle>, path: &Path) {
        if let Some(handle) = self.handle_of(path) {
            batch.push(RawEvent::bare(handle, EventFlags::MOVED_SELF));
        }
    }

    fn push_child(&self, batch: &mut EventBatch<NotifyHandle>, path: &Path, flags: EventFlags) {
        let Some(name) = path.file_name() else {
            debug!(?path, "event path has no file name");
            return;
        };
        let handle = path
            .parent()
            .and_then(|parent| self.handle_of(parent))
            .unwrap_or(NotifyHandle::UNTRACKED);
        batch.push(RawEvent::new(handle, flags, name));
    }
}

fn into_io_error(err: notify::Error) -> io::Error {
    let kind = match &err.kind {
        notify::ErrorKind::MaxFilesWatch => io::ErrorKind::StorageFull,
        notify::ErrorKind::PathNotFound | notify::ErrorKind::WatchNotFound => {
            io::ErrorKind::NotFound
        }
        notify::ErrorKind::Io(io_err) => io_err.kind(),
        _ => io::ErrorKind::Other,
    };
    io::Error::new(kind, err)
}
