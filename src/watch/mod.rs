// src/watch/mod.rs

//! Watch-set management.
//!
//! This module is responsible for:
//! - Deciding which paths must never be watched (`filter`).
//! - Abstracting the OS notification facility (`source` and its backends).
//! - Tracking which handle observes which directory (`registry`).
//! - Installing watches recursively over a directory tree (`walker`).
//!
//! It does **not** decide what to do with a change record; that lives in
//! [`crate::engine`].

pub mod filter;
#[cfg(target_os = "linux")]
pub mod inotify_source;
pub mod notify_source;
pub mod registry;
pub mod source;
pub mod walker;

pub use filter::{DEFAULT_EXCLUDED_PREFIXES, ExclusionFilter};
#[cfg(target_os = "linux")]
pub use inotify_source::InotifySource;
pub use notify_source::{NotifyHandle, NotifySource};
pub use registry::{DEFAULT_MAX_WATCHES, WatchRegistry};
pub use source::{EventBatch, EventFlags, EventSource, RawEvent};
pub use walker::{DirectoryWalker, WalkSummary};
