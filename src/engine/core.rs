// src/engine/core.rs

//! Pure classification of change records.
//!
//! Given a decoded record, the path its handle resolves to (if any) and the
//! exclusion filter, decide what the IO shell should do. No registry
//! mutation, no filesystem access, no logging, so every routing rule can be
//! unit tested directly.

use std::path::Path;

use crate::engine::{DiscardReason, Dispatch};
use crate::watch::filter::ExclusionFilter;
use crate::watch::source::RawEvent;

/// Route one record.
///
/// `parent` is the result of looking the record's handle up in the
/// registry. Overflow and watch-removal records are classified before the
/// lookup matters, since they carry no child name.
pub fn classify<H>(event: &RawEvent<H>, parent: Option<&Path>, filter: &ExclusionFilter) -> Dispatch {
    if event.flags.overflow {
        return Dispatch::Overflow;
    }
    if event.flags.watch_removed {
        return Dispatch::Prune;
    }
    if event.flags.moved_self {
        return Dispatch::Relocated;
    }

    let Some(name) = event.name.as_deref() else {
        return Dispatch::Discard(DiscardReason::NoName);
    };
    let Some(parent) = parent else {
        return Dispatch::Discard(DiscardReason::UnknownHandle);
    };

    let child = parent.join(name);
    if filter.is_excluded(&child) {
        return Dispatch::Excluded(child);
    }

    if event.flags.is_dir {
        Dispatch::WatchDirectory(child)
    } else if event.flags.created || event.flags.moved_in {
        Dispatch::MirrorFile(child)
    } else {
        Dispatch::Discard(DiscardReason::Uninteresting)
    }
}
