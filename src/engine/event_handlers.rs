// src/engine/event_handlers.rs

//! Side-effecting handlers for classified records.
//!
//! Every failure in here is local to the record being handled: it is logged
//! and counted, and the loop moves on to the next record.

use std::fs;
use std::path::Path;

use tracing::{debug, info, trace, warn};

use crate::engine::core::classify;
use crate::engine::{DiscardReason, Dispatch, MonitorStats};
use crate::mirror::FileMirror;
use crate::watch::filter::ExclusionFilter;
use crate::watch::registry::WatchRegistry;
use crate::watch::source::{EventSource, RawEvent};
use crate::watch::walker::DirectoryWalker;

/// Classify one record and act on it.
pub fn handle_record<S, M>(
    registry: &mut WatchRegistry<S>,
    filter: &ExclusionFilter,
    mirror: &M,
    stats: &mut MonitorStats,
    event: RawEvent<S::Handle>,
) where
    S: EventSource,
    M: FileMirror,
{
    stats.records += 1;

    match classify(&event, registry.lookup(&event.handle), filter) {
        Dispatch::WatchDirectory(path) => handle_new_directory(registry, filter, stats, &path),
        Dispatch::MirrorFile(path) => handle_new_file(mirror, stats, &path),
        Dispatch::Excluded(path) => {
            stats.excluded += 1;
            info!("skipping excluded path: {}", path.display());
        }
        Dispatch::Prune => handle_watch_removed(registry, stats, &event.handle),
        Dispatch::Relocated => handle_watch_moved(registry, filter, stats, &event.handle),
        Dispatch::Overflow => {
            stats.overflows += 1;
            warn!("event queue overflowed; some notifications were lost");
        }
        Dispatch::Discard(reason) => {
            stats.discarded += 1;
            match reason {
                DiscardReason::UnknownHandle => {
                    debug!(handle = ?event.handle, name = ?event.name, "discarding record for unknown watch");
                }
                DiscardReason::NoName | DiscardReason::Uninteresting => {
                    trace!(?event, ?reason, "discarding record");
                }
            }
        }
    }
}

/// Watch a new directory and whatever already exists below it.
///
/// Files already inside the directory are not mirrored; only later creation
/// records for them are.
pub fn handle_new_directory<S: EventSource>(
    registry: &mut WatchRegistry<S>,
    filter: &ExclusionFilter,
    stats: &mut MonitorStats,
    path: &Path,
) {
    info!("new directory detected: {}", path.display());
    stats.directories_detected += 1;

    match DirectoryWalker::new(filter).install(registry, path) {
        Ok(summary) => {
            if summary.exhausted {
                stats.registry_full += 1;
            }
            debug!(?path, ?summary, "installed watches for new directory");
        }
        // Typically the directory vanished again before we got to it.
        Err(err) => warn!("{err}"),
    }
}

pub fn handle_new_file<M: FileMirror>(mirror: &M, stats: &mut MonitorStats, path: &Path) {
    info!("new file detected: {}", path.display());
    stats.files_detected += 1;

    match mirror.mirror(path) {
        Ok(report) => {
            stats.files_mirrored += 1;
            info!(
                "copied {} to {} ({} bytes)",
                report.source.display(),
                report.destination.display(),
                report.bytes
            );
        }
        Err(err) => {
            stats.mirror_failures += 1;
            warn!("{err}");
        }
    }
}

pub fn handle_watch_removed<S: EventSource>(
    registry: &mut WatchRegistry<S>,
    stats: &mut MonitorStats,
    handle: &S::Handle,
) {
    match registry.forget(handle) {
        Some(path) => {
            stats.watches_pruned += 1;
            info!("stopped watching removed directory: {}", path.display());
        }
        None => debug!(?handle, "watch removal for unknown handle"),
    }
}

/// Drop the watches recorded under a renamed directory's old path, then
/// watch whatever sits at that path now.
///
/// A rename inside the tree also produces a moved-in record for the new
/// name, which installs watches under the new path on its own.
pub fn handle_watch_moved<S: EventSource>(
    registry: &mut WatchRegistry<S>,
    filter: &ExclusionFilter,
    stats: &mut MonitorStats,
    handle: &S::Handle,
) {
    let Some(old_path) = registry.lookup(handle).map(Path::to_path_buf) else {
        debug!(?handle, "rename of unknown watch");
        return;
    };

    let released = registry.release_subtree(&old_path);
    stats.watches_pruned += released as u64;
    info!(
        "watched directory moved: {} ({released} watches released)",
        old_path.display()
    );

    if !fs::symlink_metadata(&old_path).is_ok_and(|meta| meta.is_dir()) {
        return;
    }
    match DirectoryWalker::new(filter).install(registry, &old_path) {
        Ok(summary) => {
            if summary.exhausted {
                stats.registry_full += 1;
            }
            debug!(path = ?old_path, ?summary, "rewatched directory at old path");
        }
        Err(err) => warn!("{err}"),
    }
}
