use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use treemirror::errors::MirrorError;
use treemirror::mirror::{FileMirror, MirrorReport};

#[derive(Debug, Default)]
struct Recorded {
    mirrored: Vec<PathBuf>,
    failing: HashSet<PathBuf>,
}

/// A mirror that copies nothing and records which paths it was asked for.
///
/// Clones share the record, so keep one for assertions before handing another
/// to the monitor.
#[derive(Debug, Clone, Default)]
pub struct RecordingMirror {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make mirroring `path` fail as if the file had vanished.
    pub fn fail_on(&self, path: impl Into<PathBuf>) {
        self.inner.lock().unwrap().failing.insert(path.into());
    }

    /// Every path passed to `mirror`, in call order, failures included.
    pub fn requested(&self) -> Vec<PathBuf> {
        self.inner.lock().unwrap().mirrored.clone()
    }
}

impl FileMirror for RecordingMirror {
    fn mirror(&self, source: &Path) -> Result<MirrorReport, MirrorError> {
        let mut inner = self.inner.lock().unwrap();
        inner.mirrored.push(source.to_path_buf());

        if inner.failing.contains(source) {
            return Err(MirrorError::OpenSource {
                path: source.to_path_buf(),
                source: io::Error::from(io::ErrorKind::NotFound),
            });
        }

        let name = source
            .file_name()
            .ok_or_else(|| MirrorError::NoFileName(source.to_path_buf()))?;
        Ok(MirrorReport {
            source: source.to_path_buf(),
            destination: Path::new("/staging").join(name),
            bytes: 0,
        })
    }
}
