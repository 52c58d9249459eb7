// src/mirror/mod.rs

//! Copying newly detected files into the staging directory.
//!
//! A mirror is a best-effort snapshot: whatever bytes the source holds when
//! it is read are copied, with no coordination with a writer that may still
//! be filling the file. Files with the same base name from different
//! directories overwrite each other in the staging directory.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::MirrorError;
use crate::fs::FileSystem;

/// Staging directory used when none is given on the command line.
pub const DEFAULT_STAGING_DIR: &str = "/tmp/_files";

/// Result of one successful copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorReport {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub bytes: u64,
}

/// Collaborator invoked for every newly detected file.
///
/// Implementations must not panic on I/O failures; the monitor logs the
/// returned error and carries on.
pub trait FileMirror: Send {
    fn mirror(&self, source: &Path) -> Result<MirrorReport, MirrorError>;
}

/// Copies files into a flat staging directory, named by their base name.
#[derive(Debug, Clone)]
pub struct StagingMirror<F: FileSystem> {
    fs: F,
    staging_dir: PathBuf,
}

impl<F: FileSystem> StagingMirror<F> {
    pub fn new(fs: F, staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            staging_dir: staging_dir.into(),
        }
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Where a copy of `source` ends up.
    pub fn destination_for(&self, source: &Path) -> Result<PathBuf, MirrorError> {
        let name = source
            .file_name()
            .ok_or_else(|| MirrorError::NoFileName(source.to_path_buf()))?;
        Ok(self.staging_dir.join(name))
    }
}

impl<F: FileSystem> FileMirror for StagingMirror<F> {
    fn mirror(&self, source: &Path) -> Result<MirrorReport, MirrorError> {
        let destination = self.destination_for(source)?;

        let open_error = |err: io::Error| MirrorError::OpenSource {
            path: source.to_path_buf(),
            source: err,
        };
        if !self.fs.is_regular_file(source).map_err(open_error)? {
            return Err(MirrorError::NotRegularFile(source.to_path_buf()));
        }

        let mut reader = self
            .fs
            .open_read(source)
            .map_err(open_error)?;

        let mut writer =
            self.fs
                .create_truncate(&destination)
                .map_err(|err| MirrorError::CreateDestination {
                    path: destination.clone(),
                    source: err,
                })?;

        let copy_error = |err: io::Error| MirrorError::Copy {
            path: destination.clone(),
            source: err,
        };
        let bytes = io::copy(&mut reader, &mut writer).map_err(copy_error)?;
        writer.flush().map_err(copy_error)?;

        debug!(?source, ?destination, bytes, "mirrored file");
        Ok(MirrorReport {
            source: source.to_path_buf(),
            destination,
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn mirror_with(fs: &MockFileSystem) -> StagingMirror<MockFileSystem> {
        fs.add_dir("/staging");
        StagingMirror::new(fs.clone(), "/staging")
    }

    #[test]
    fn copies_bytes_under_the_base_name() {
        let fs = MockFileSystem::new();
        fs.add_file("/data/a/report.csv", b"id,value\n1,2\n".to_vec());
        let mirror = mirror_with(&fs);

        let report = mirror.mirror(Path::new("/data/a/report.csv")).unwrap();

        assert_eq!(report.destination, Path::new("/staging/report.csv"));
        assert_eq!(report.bytes, 13);
        assert_eq!(
            fs.contents("/staging/report.csv"),
            Some(b"id,value\n1,2\n".to_vec())
        );
    }

    #[test]
    fn existing_destination_is_truncated_and_replaced() {
        let fs = MockFileSystem::new();
        let mirror = mirror_with(&fs);
        fs.add_file("/staging/notes.txt", b"a much longer previous version".to_vec());
        fs.add_file("/data/notes.txt", b"short".to_vec());

        mirror.mirror(Path::new("/data/notes.txt")).unwrap();

        assert_eq!(fs.contents("/staging/notes.txt"), Some(b"short".to_vec()));
    }

    #[test]
    fn unreadable_source_is_reported() {
        let fs = MockFileSystem::new();
        let mirror = mirror_with(&fs);
        fs.add_file("/data/secret", b"x".to_vec());
        fs.deny_read("/data/secret");

        let err = mirror.mirror(Path::new("/data/secret")).unwrap_err();
        assert!(matches!(err, MirrorError::OpenSource { .. }));
        assert_eq!(fs.contents("/staging/secret"), None);
    }

    #[test]
    fn missing_staging_directory_is_reported() {
        let fs = MockFileSystem::new();
        fs.add_file("/data/a.txt", b"x".to_vec());
        let mirror = StagingMirror::new(fs.clone(), "/nowhere");

        let err = mirror.mirror(Path::new("/data/a.txt")).unwrap_err();
        assert!(matches!(err, MirrorError::CreateDestination { .. }));
    }

    #[test]
    fn partial_write_is_reported() {
        let fs = MockFileSystem::new();
        let mirror = mirror_with(&fs);
        fs.add_file("/data/big.bin", vec![7u8; 64]);
        fs.fail_writes_after("/staging/big.bin", 10);

        let err = mirror.mirror(Path::new("/data/big.bin")).unwrap_err();
        assert!(matches!(err, MirrorError::Copy { .. }));
        assert_eq!(fs.contents("/staging/big.bin").map(|c| c.len()), Some(10));
    }

    #[test]
    fn special_files_are_not_opened() {
        let fs = MockFileSystem::new();
        let mirror = mirror_with(&fs);
        fs.add_special("/data/pipe");
        fs.add_dir("/data/sub");

        for path in ["/data/pipe", "/data/sub"] {
            let err = mirror.mirror(Path::new(path)).unwrap_err();
            assert!(matches!(err, MirrorError::NotRegularFile(_)), "{path}: {err}");
        }
        assert_eq!(fs.contents("/staging/pipe"), None);
    }

    #[test]
    fn vanished_source_is_an_open_error() {
        let fs = MockFileSystem::new();
        let mirror = mirror_with(&fs);
        let err = mirror.mirror(Path::new("/data/gone")).unwrap_err();
        assert!(matches!(err, MirrorError::OpenSource { .. }));
    }

    #[test]
    fn root_path_has_no_file_name() {
        let fs = MockFileSystem::new();
        let mirror = mirror_with(&fs);
        let err = mirror.mirror(Path::new("/")).unwrap_err();
        assert!(matches!(err, MirrorError::NoFileName(_)));
    }
}
