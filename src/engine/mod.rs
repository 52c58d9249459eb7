// src/engine/mod.rs

//! Event dispatch for treemirror.
//!
//! This module ties together:
//! - the watch registry and the recursive walker (new directories)
//! - the file mirror (new files)
//! - the main loop that drains batches from the event source
//!
//! The pure classification of a single record lives in [`core`]; the
//! side-effecting handlers are in [`event_handlers`] and the async/IO shell
//! is implemented in [`runtime`].

use std::path::PathBuf;

/// What to do with one decoded change record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// A directory appeared: watch it and everything already below it.
    WatchDirectory(PathBuf),
    /// A file was created or moved in: mirror it.
    MirrorFile(PathBuf),
    /// The child lies under an excluded prefix and is never acted upon.
    Excluded(PathBuf),
    /// The source released the watch on its own; drop the registry entry.
    Prune,
    /// The watched directory was renamed: release the watches recorded
    /// under its old path and rewatch whatever sits there now.
    Relocated,
    /// The source lost records.
    Overflow,
    /// Nothing to do.
    Discard(DiscardReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// The record names no child entry.
    NoName,
    /// The handle is not (or no longer) in the registry.
    UnknownHandle,
    /// Neither a directory nor a created/moved-in file.
    Uninteresting,
}

/// Counters kept for the lifetime of one monitor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub batches: u64,
    pub records: u64,
    pub directories_detected: u64,
    pub files_detected: u64,
    pub files_mirrored: u64,
    pub mirror_failures: u64,
    pub discarded: u64,
    pub excluded: u64,
    pub watches_pruned: u64,
    pub overflows: u64,
    /// Directories left unwatched because the registry was full.
    pub registry_full: u64,
    /// Watches released at shutdown.
    pub watches_released: u64,
}

pub mod core;
pub mod event_handlers;
pub mod runtime;

pub use self::core::classify;
pub use runtime::Monitor;
