// src/watch/inotify_source.rs

//! Linux inotify backend.
//!
//! One kernel watch per directory; the kernel's watch descriptors are the
//! registry handles. The descriptor is non-blocking and driven by tokio's
//! `AsyncFd`, so waiting for the next batch is the only await point.

use std::ffi::OsStr;
use std::io;
use std::path::Path;

use inotify::{EventMask, Inotify, WatchDescriptor, WatchMask};
use tokio::io::unix::AsyncFd;
use tracing::debug;

use crate::watch::source::{BatchFuture, EventBatch, EventFlags, EventSource, RawEvent};

/// Room for roughly a thousand records with short names per read.
pub const EVENT_BUFFER_LEN: usize = 1024 * (16 + 16);

/// Creation and moved-in events, plus renames of the watched directory
/// itself; directories only.
const WATCH_MASK: WatchMask = WatchMask::CREATE
    .union(WatchMask::MOVED_TO)
    .union(WatchMask::MOVE_SELF)
    .union(WatchMask::ONLYDIR);

pub struct InotifySource {
    fd: AsyncFd<Inotify>,
    buffer: Vec<u8>,
}

impl std::fmt::Debug for InotifySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InotifySource").finish_non_exhaustive()
    }
}

impl InotifySource {
    /// Acquire a new inotify instance.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new() -> io::Result<Self> {
        let inotify = Inotify::init()?;
        Ok(Self {
            fd: AsyncFd::new(inotify)?,
            buffer: vec![0; EVENT_BUFFER_LEN],
        })
    }
}

impl EventSource for InotifySource {
    type Handle = WatchDescriptor;

    fn add_watch(&mut self, path: &Path) -> io::Result<WatchDescriptor> {
        // ENOSPC from inotify_add_watch already maps to StorageFull.
        self.fd.get_ref().watches().add(path, WATCH_MASK)
    }

    fn remove_watch(&mut self, handle: &WatchDescriptor) -> io::Result<()> {
        self.fd.get_ref().watches().remove(handle.clone())
    }

    fn next_batch(&mut self) -> BatchFuture<'_, WatchDescriptor> {
        Box::pin(async move {
            loop {
                let mut guard = self.fd.readable_mut().await?;
                let buffer = &mut self.buffer;
                match guard.try_io(|inner| decode_batch(inner.get_mut(), buffer)) {
                    Ok(Ok(batch)) if batch.is_empty() => guard.clear_ready(),
                    Ok(result) => return result,
                    Err(_would_block) => continue,
                }
            }
        })
    }
}

fn decode_batch(inotify: &mut Inotify, buffer: &mut [u8]) -> io::Result<EventBatch<WatchDescriptor>> {
    let batch: EventBatch<WatchDescriptor> = inotify
        .read_events(buffer)?
        .map(|event| RawEvent {
            handle: event.wd,
            flags: decode_mask(event.mask),
            name: event.name.map(OsStr::to_os_string),
        })
        .collect();
    debug!(records = batch.len(), "decoded inotify batch");
    Ok(batch)
}

fn decode_mask(mask: EventMask) -> EventFlags {
    EventFlags {
        is_dir: mask.contains(EventMask::ISDIR),
        created: mask.contains(EventMask::CREATE),
        moved_in: mask.contains(EventMask::MOVED_TO),
        watch_removed: mask.contains(EventMask::IGNORED),
        moved_self: mask.contains(EventMask::MOVE_SELF),
        overflow: mask.contains(EventMask::Q_OVERFLOW),
    }
}
