#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;

/// Create every directory in `dirs` (relative to `root`), parents included.
pub fn make_dirs(root: &Path, dirs: &[&str]) -> Result<Vec<PathBuf>> {
    let mut created = Vec::with_capacity(dirs.len());
    for dir in dirs {
        let path = root.join(dir);
        fs::create_dir_all(&path)?;
        created.push(path);
    }
    Ok(created)
}

/// Write `contents` to `root/rel`, creating parent directories as needed.
pub fn write_file(root: &Path, rel: &str, contents: &[u8]) -> Result<PathBuf> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, contents)?;
    Ok(path)
}

/// A tempdir resolved to its canonical path.
///
/// Watched paths are always canonical, so tests compare against this.
pub struct CanonicalTempDir {
    _dir: tempfile::TempDir,
    path: PathBuf,
}

impl CanonicalTempDir {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let path = fs::canonicalize(dir.path())?;
        Ok(Self { _dir: dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
