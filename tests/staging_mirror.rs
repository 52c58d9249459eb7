// tests/staging_mirror.rs

mod common;
use crate::common::builders::{CanonicalTempDir, write_file};

use std::fs;

use treemirror::errors::MirrorError;
use treemirror::fs::RealFileSystem;
use treemirror::mirror::{FileMirror, StagingMirror};

#[test]
fn copies_bytes_under_the_base_name() {
    let src = CanonicalTempDir::new().unwrap();
    let staging = CanonicalTempDir::new().unwrap();
    let file = write_file(src.path(), "deep/er/photo.jpg", b"\xff\xd8binary\x00data").unwrap();

    let mirror = StagingMirror::new(RealFileSystem, staging.path());
    let report = mirror.mirror(&file).unwrap();

    assert_eq!(report.destination, staging.path().join("photo.jpg"));
    assert_eq!(report.bytes, 13);
    assert_eq!(
        fs::read(staging.path().join("photo.jpg")).unwrap(),
        b"\xff\xd8binary\x00data"
    );
}

#[test]
fn same_base_name_overwrites_the_earlier_copy() {
    let src = CanonicalTempDir::new().unwrap();
    let staging = CanonicalTempDir::new().unwrap();
    let first = write_file(src.path(), "a/log.txt", b"first and longer").unwrap();
    let second = write_file(src.path(), "b/log.txt", b"second").unwrap();

    let mirror = StagingMirror::new(RealFileSystem, staging.path());
    mirror.mirror(&first).unwrap();
    mirror.mirror(&second).unwrap();

    assert_eq!(
        fs::read_to_string(staging.path().join("log.txt")).unwrap(),
        "second"
    );
}

#[test]
fn vanished_source_is_reported() {
    let src = CanonicalTempDir::new().unwrap();
    let staging = CanonicalTempDir::new().unwrap();

    let mirror = StagingMirror::new(RealFileSystem, staging.path());
    let err = mirror.mirror(&src.path().join("gone.tmp")).unwrap_err();

    assert!(matches!(err, MirrorError::OpenSource { .. }));
    assert!(!staging.path().join("gone.tmp").exists());
}

#[cfg(unix)]
#[test]
fn symlink_to_a_device_is_not_followed() {
    let src = CanonicalTempDir::new().unwrap();
    let staging = CanonicalTempDir::new().unwrap();
    let link = src.path().join("z");
    std::os::unix::fs::symlink("/dev/zero", &link).unwrap();

    let mirror = StagingMirror::new(RealFileSystem, staging.path());
    let err = mirror.mirror(&link).unwrap_err();

    assert!(matches!(err, MirrorError::NotRegularFile(_)), "{err}");
    assert!(!staging.path().join("z").exists());
}

#[cfg(unix)]
#[test]
fn fifo_is_rejected_without_blocking() {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let src = CanonicalTempDir::new().unwrap();
    let staging = CanonicalTempDir::new().unwrap();
    let fifo = src.path().join("pipe");
    let c_path = CString::new(fifo.as_os_str().as_bytes()).unwrap();
    assert_eq!(unsafe { libc::mkfifo(c_path.as_ptr(), 0o644) }, 0);

    let mirror = StagingMirror::new(RealFileSystem, staging.path());
    let err = mirror.mirror(&fifo).unwrap_err();

    assert!(matches!(err, MirrorError::NotRegularFile(_)), "{err}");
    assert!(!staging.path().join("pipe").exists());
}

#[cfg(unix)]
#[test]
fn open_read_refuses_special_files_even_without_the_check() {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;
    use treemirror::fs::FileSystem;

    let src = CanonicalTempDir::new().unwrap();
    let link = src.path().join("zero");
    std::os::unix::fs::symlink("/dev/zero", &link).unwrap();
    let fifo = src.path().join("pipe");
    let c_path = CString::new(fifo.as_os_str().as_bytes()).unwrap();
    assert_eq!(unsafe { libc::mkfifo(c_path.as_ptr(), 0o644) }, 0);

    assert!(RealFileSystem.open_read(&link).is_err());
    assert!(RealFileSystem.open_read(&fifo).is_err());
}
