// src/fs/mock.rs

use super::FileSystem;
use std::collections::{HashMap, HashSet};
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File(Vec<u8>),
    Dir,
    /// FIFO, socket or device node.
    Special,
}

#[derive(Debug, Default)]
struct MockState {
    entries: HashMap<PathBuf, MockEntry>,
    /// Writes to these paths fail after the first `limit` bytes.
    short_writes: HashMap<PathBuf, usize>,
    unreadable: HashSet<PathBuf>,
}

/// In-memory filesystem for mirror tests.
///
/// Clones share state, so a test can keep one clone for inspection after
/// handing another to the code under test.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref();
        let mut state = self.lock();
        if let Some(parent) = path.parent() {
            ensure_dirs(&mut state, parent);
        }
        state
            .entries
            .insert(path.to_path_buf(), MockEntry::File(content.into()));
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        ensure_dirs(&mut self.lock(), path.as_ref());
    }

    pub fn add_special(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut state = self.lock();
        if let Some(parent) = path.parent() {
            ensure_dirs(&mut state, parent);
        }
        state.entries.insert(path.to_path_buf(), MockEntry::Special);
    }

    /// Contents of a file, if it exists.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.lock().entries.get(path.as_ref()) {
            Some(MockEntry::File(content)) => Some(content.clone()),
            _ => None,
        }
    }

    /// Make writes to `path` fail once `limit` bytes have been accepted.
    pub fn fail_writes_after(&self, path: impl AsRef<Path>, limit: usize) {
        self.lock()
            .short_writes
            .insert(path.as_ref().to_path_buf(), limit);
    }

    /// Make opening `path` for reading fail with permission denied.
    pub fn deny_read(&self, path: impl AsRef<Path>) {
        self.lock().unreadable.insert(path.as_ref().to_path_buf());
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the state from the others.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn ensure_dirs(state: &mut MockState, path: &Path) {
    for ancestor in path.ancestors() {
        if ancestor.as_os_str().is_empty() {
            continue;
        }
        state
            .entries
            .entry(ancestor.to_path_buf())
            .or_insert(MockEntry::Dir);
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("not found: {}", path.display()))
}

impl FileSystem for MockFileSystem {
    fn is_regular_file(&self, path: &Path) -> io::Result<bool> {
        match self.lock().entries.get(path) {
            Some(MockEntry::File(_)) => Ok(true),
            Some(_) => Ok(false),
            None => Err(not_found(path)),
        }
    }

    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        let state = self.lock();
        if state.unreadable.contains(path) {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }
        match state.entries.get(path) {
            Some(MockEntry::File(content)) => Ok(Box::new(Cursor::new(content.clone()))),
            Some(MockEntry::Dir) => Err(io::Error::from(io::ErrorKind::IsADirectory)),
            Some(MockEntry::Special) => Err(io::Error::from(io::ErrorKind::WouldBlock)),
            None => Err(not_found(path)),
        }
    }

    fn create_truncate(&self, path: &Path) -> io::Result<Box<dyn Write + Send>> {
        let mut state = self.lock();
        let parent_is_dir = path
            .parent()
            .is_some_and(|parent| matches!(state.entries.get(parent), Some(MockEntry::Dir)));
        if !parent_is_dir {
            return Err(not_found(path));
        }
        if let Some(MockEntry::Dir) = state.entries.get(path) {
            return Err(io::Error::from(io::ErrorKind::IsADirectory));
        }
        state
            .entries
            .insert(path.to_path_buf(), MockEntry::File(Vec::new()));
        let remaining = state.short_writes.get(path).copied();

        Ok(Box::new(MockWriter {
            state: Arc::clone(&self.state),
            path: path.to_path_buf(),
            remaining,
        }))
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        if let Some(MockEntry::File(_)) = self.lock().entries.get(path) {
            return Err(io::Error::from(io::ErrorKind::AlreadyExists));
        }
        self.add_dir(path);
        Ok(())
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        // Tests use absolute paths throughout.
        if self.lock().entries.contains_key(path) {
            Ok(path.to_path_buf())
        } else {
            Err(not_found(path))
        }
    }
}

/// Appends straight into the shared entry so partial writes stay visible.
struct MockWriter {
    state: Arc<Mutex<MockState>>,
    path: PathBuf,
    remaining: Option<usize>,
}

impl Write for MockWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let accepted = match self.remaining {
            Some(0) => return Err(io::Error::new(io::ErrorKind::StorageFull, "mock disk full")),
            Some(remaining) => remaining.min(buf.len()),
            None => buf.len(),
        };
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= accepted;
        }

        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match state.entries.get_mut(&self.path) {
            Some(MockEntry::File(content)) => {
                content.extend_from_slice(&buf[..accepted]);
                Ok(accepted)
            }
            _ => Err(not_found(&self.path)),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn written_files_are_readable() {
        let fs = MockFileSystem::new();
        fs.add_dir("/staging");

        let mut writer = fs.create_truncate(Path::new("/staging/a.txt")).unwrap();
        writer.write_all(b"hello").unwrap();

        let mut out = String::new();
        fs.open_read(Path::new("/staging/a.txt"))
            .unwrap()
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, "hello");
    }

    #[test]
    fn create_requires_existing_parent() {
        let fs = MockFileSystem::new();
        let err = fs.create_truncate(Path::new("/missing/a.txt")).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn short_writes_keep_the_accepted_prefix() {
        let fs = MockFileSystem::new();
        fs.add_dir("/staging");
        fs.fail_writes_after("/staging/a.txt", 3);

        let mut writer = fs.create_truncate(Path::new("/staging/a.txt")).unwrap();
        assert!(writer.write_all(b"hello").is_err());
        assert_eq!(fs.contents("/staging/a.txt"), Some(b"hel".to_vec()));
    }
}
