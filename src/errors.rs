// src/errors.rs

//! Crate-wide error types.
//!
//! Only [`TreeMirrorError`] ever reaches `main`. The other enums describe
//! failures that the monitor recovers from locally (a directory it could not
//! watch, a file it could not mirror) and are logged where they occur.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeMirrorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization error: {0}")]
    Init(String),

    #[error(transparent)]
    Walk(#[from] WalkError),

    #[error("failed to read from event source: {0}")]
    Read(#[source] io::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Why a path could not be added to the watch registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// No watch capacity left, either the configured limit or the kernel's.
    #[error("watch registry full ({capacity} watches); not watching {}", path.display())]
    Full { path: PathBuf, capacity: usize },

    #[error("failed to watch {}: {source}", path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failure to start a recursive walk at all.
///
/// Errors below the walk root are logged and skipped by the walker and never
/// surface as a `WalkError`.
#[derive(Error, Debug)]
pub enum WalkError {
    #[error("cannot traverse directory {}: {source}", path.display())]
    Root {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("source path {} has no file name", .0.display())]
    NoFileName(PathBuf),

    /// Symlinks, FIFOs, sockets and device nodes are never copied.
    #[error("not a regular file: {}", .0.display())]
    NotRegularFile(PathBuf),

    #[error("failed to open source file {}: {source}", path.display())]
    OpenSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create destination file {}: {source}", path.display())]
    CreateDestination {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("copy to {} failed: {source}", path.display())]
    Copy {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, TreeMirrorError>;
