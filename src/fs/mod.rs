// src/fs/mod.rs

//! Filesystem access used by the mirror.
//!
//! The walker reads directories through `walkdir` directly; only the copy
//! path goes through this trait so mirror failures can be simulated in tests.

use std::fmt::Debug;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

pub mod mock;

/// Abstract filesystem interface.
pub trait FileSystem: Send + Sync + Debug {
    /// Whether `path` itself, not a symlink target, is a regular file.
    fn is_regular_file(&self, path: &Path) -> io::Result<bool>;

    /// Open a regular file for reading.
    ///
    /// Must not follow a symlink in the last component, and must not block
    /// on FIFOs or devices; anything but a regular file is an error.
    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + Send>>;

    /// Create `path`, truncating any existing file. The parent must exist.
    fn create_truncate(&self, path: &Path) -> io::Result<Box<dyn Write + Send>>;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn is_regular_file(&self, path: &Path) -> io::Result<bool> {
        Ok(fs::symlink_metadata(path)?.file_type().is_file())
    }

    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        let mut options = fs::OpenOptions::new();
        options.read(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            // The entry may have been swapped since it was checked.
            options.custom_flags(libc::O_NOFOLLOW | libc::O_NONBLOCK);
        }

        let file = options.open(path)?;
        if !file.metadata()?.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a regular file: {}", path.display()),
            ));
        }
        Ok(Box::new(file))
    }

    fn create_truncate(&self, path: &Path) -> io::Result<Box<dyn Write + Send>> {
        Ok(Box::new(fs::File::create(path)?))
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }
}
