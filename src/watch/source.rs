// src/watch/source.rs

//! Pluggable filesystem-event source.
//!
//! The registry and the monitor talk to an `EventSource` instead of a raw
//! inotify descriptor. Production code uses [`InotifySource`] on Linux or
//! [`NotifySource`] elsewhere; tests provide a scripted fake.
//!
//! [`InotifySource`]: crate::watch::InotifySource
//! [`NotifySource`]: crate::watch::NotifySource

use std::ffi::OsString;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::io;
use std::path::Path;
use std::pin::Pin;

/// Flags decoded from one change record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventFlags {
    /// The affected child is a directory.
    pub is_dir: bool,
    /// The child was created inside the watched directory.
    pub created: bool,
    /// The child was renamed into the watched directory.
    pub moved_in: bool,
    /// The source dropped the watch itself (directory deleted or unmounted).
    pub watch_removed: bool,
    /// The watched directory itself was renamed; its stored path is stale.
    pub moved_self: bool,
    /// The source's queue overflowed; some records were lost.
    pub overflow: bool,
}

impl EventFlags {
    pub const CREATED_FILE: EventFlags = EventFlags {
        is_dir: false,
        created: true,
        moved_in: false,
        watch_removed: false,
        moved_self: false,
        overflow: false,
    };

    pub const MOVED_IN_FILE: EventFlags = EventFlags {
        is_dir: false,
        created: false,
        moved_in: true,
        watch_removed: false,
        moved_self: false,
        overflow: false,
    };

    pub const CREATED_DIR: EventFlags = EventFlags {
        is_dir: true,
        created: true,
        moved_in: false,
        watch_removed: false,
        moved_self: false,
        overflow: false,
    };

    pub const MOVED_IN_DIR: EventFlags = EventFlags {
        is_dir: true,
        created: false,
        moved_in: true,
        watch_removed: false,
        moved_self: false,
        overflow: false,
    };

    pub const WATCH_REMOVED: EventFlags = EventFlags {
        is_dir: false,
        created: false,
        moved_in: false,
        watch_removed: true,
        moved_self: false,
        overflow: false,
    };

    pub const MOVED_SELF: EventFlags = EventFlags {
        is_dir: false,
        created: false,
        moved_in: false,
        watch_removed: false,
        moved_self: true,
        overflow: false,
    };

    pub const OVERFLOW: EventFlags = EventFlags {
        is_dir: false,
        created: false,
        moved_in: false,
        watch_removed: false,
        moved_self: false,
        overflow: true,
    };
}

/// One decoded change record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent<H> {
    /// Watch the record pertains to.
    pub handle: H,
    pub flags: EventFlags,
    /// Name of the affected entry relative to the watched directory, if any.
    pub name: Option<OsString>,
}

impl<H> RawEvent<H> {
    pub fn new(handle: H, flags: EventFlags, name: impl Into<OsString>) -> Self {
        Self {
            handle,
            flags,
            name: Some(name.into()),
        }
    }

    /// A record that carries no child name (overflow, watch removal).
    pub fn bare(handle: H, flags: EventFlags) -> Self {
        Self {
            handle,
            flags,
            name: None,
        }
    }
}

/// Records delivered together by one blocking read, in delivery order.
pub type EventBatch<H> = Vec<RawEvent<H>>;

/// Future returned by [`EventSource::next_batch`].
pub type BatchFuture<'a, H> = Pin<Box<dyn Future<Output = io::Result<EventBatch<H>>> + Send + 'a>>;

/// Trait abstracting the OS notification facility.
pub trait EventSource: Send {
    /// Opaque identifier issued when a watch is installed.
    type Handle: Clone + Eq + Hash + Debug + Send;

    /// Start watching `path` (a directory) for created and moved-in entries.
    ///
    /// Watching an already watched directory returns its existing handle.
    /// Running out of kernel watches must surface as
    /// `io::ErrorKind::StorageFull`.
    fn add_watch(&mut self, path: &Path) -> io::Result<Self::Handle>;

    fn remove_watch(&mut self, handle: &Self::Handle) -> io::Result<()>;

    /// Wait for at least one record and return everything currently pending.
    ///
    /// An error here means the source is unusable.
    fn next_batch(&mut self) -> BatchFuture<'_, Self::Handle>;
}
