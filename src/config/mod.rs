// src/config/mod.rs

//! Runtime configuration for treemirror.
//!
//! There is no configuration file: everything comes from the command line
//! plus compiled-in defaults. Responsibilities:
//! - Collect the unchecked values (`RawMonitorConfig`).
//! - Validate them into a `MonitorConfig` (`validate.rs`).
//! - Resolve the validated config against the filesystem (`prepare`).

use std::path::PathBuf;

use tracing::debug;

use crate::cli::CliArgs;
use crate::errors::{Result, TreeMirrorError, WalkError};
use crate::fs::FileSystem;
use crate::types::Backend;
use crate::watch::filter::{DEFAULT_EXCLUDED_PREFIXES, ExclusionFilter};

pub mod validate;

/// Values as given, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMonitorConfig {
    pub root: PathBuf,
    pub staging_dir: PathBuf,
    pub default_excludes: bool,
    pub extra_excludes: Vec<String>,
    pub max_watches: usize,
    pub backend: Backend,
}

impl From<&CliArgs> for RawMonitorConfig {
    fn from(args: &CliArgs) -> Self {
        Self {
            root: args.root.clone(),
            staging_dir: args.staging_dir.clone(),
            default_excludes: !args.no_default_excludes,
            extra_excludes: args.exclude.clone(),
            max_watches: args.max_watches,
            backend: args.backend,
        }
    }
}

/// Validated configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    pub root: PathBuf,
    pub staging_dir: PathBuf,
    /// Excluded prefixes in match order: defaults first, then extras.
    pub excluded_prefixes: Vec<String>,
    pub max_watches: usize,
    pub backend: Backend,
}

impl MonitorConfig {
    /// Build a config without running validation.
    ///
    /// Prefer `MonitorConfig::try_from(raw)`.
    pub fn new_unchecked(raw: RawMonitorConfig) -> Self {
        let mut excluded_prefixes: Vec<String> = Vec::new();
        if raw.default_excludes {
            excluded_prefixes.extend(DEFAULT_EXCLUDED_PREFIXES.iter().map(|p| p.to_string()));
        }
        for prefix in raw.extra_excludes {
            if !excluded_prefixes.contains(&prefix) {
                excluded_prefixes.push(prefix);
            }
        }

        Self {
            root: raw.root,
            staging_dir: raw.staging_dir,
            excluded_prefixes,
            max_watches: raw.max_watches,
            backend: raw.backend,
        }
    }
}

/// Filesystem-resolved inputs for the monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepared {
    /// Canonical root.
    pub root: PathBuf,
    /// Canonical staging directory, guaranteed to exist.
    pub staging_dir: PathBuf,
    /// Configured prefixes plus the staging directory.
    pub filter: ExclusionFilter,
}

/// Create the staging directory, canonicalise both paths and build the
/// exclusion filter.
///
/// The staging directory is excluded so that copies never trigger further
/// copies. A root that is itself excluded is rejected.
pub fn prepare<F: FileSystem>(cfg: &MonitorConfig, fs: &F) -> Result<Prepared> {
    fs.create_dir_all(&cfg.staging_dir).map_err(|err| {
        TreeMirrorError::Init(format!(
            "cannot create staging directory {}: {err}",
            cfg.staging_dir.display()
        ))
    })?;
    let staging_dir = fs.canonicalize(&cfg.staging_dir).map_err(|err| {
        TreeMirrorError::Init(format!(
            "cannot resolve staging directory {}: {err}",
            cfg.staging_dir.display()
        ))
    })?;

    let root = fs.canonicalize(&cfg.root).map_err(|source| WalkError::Root {
        path: cfg.root.clone(),
        source,
    })?;

    let mut filter = ExclusionFilter::new(cfg.excluded_prefixes.iter().cloned());
    filter.push(staging_dir.to_string_lossy().into_owned());

    if filter.is_excluded(&root) {
        return Err(TreeMirrorError::Config(format!(
            "root {} lies under an excluded prefix ({filter})",
            root.display()
        )));
    }

    debug!(?root, ?staging_dir, %filter, "configuration resolved");
    Ok(Prepared {
        root,
        staging_dir,
        filter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn config(root: &str, staging: &str) -> MonitorConfig {
        MonitorConfig::new_unchecked(RawMonitorConfig {
            root: PathBuf::from(root),
            staging_dir: PathBuf::from(staging),
            default_excludes: true,
            extra_excludes: vec!["/var/cache".to_string(), "/proc".to_string()],
            max_watches: 10,
            backend: Backend::Notify,
        })
    }

    #[test]
    fn defaults_come_first_and_duplicates_are_dropped() {
        let cfg = config("/data", "/staging");
        assert_eq!(
            cfg.excluded_prefixes,
            ["/sys", "/proc", "/dev", "/run", "/var/cache"]
        );
    }

    #[test]
    fn prepare_creates_staging_and_excludes_it() {
        let fs = MockFileSystem::new();
        fs.add_dir("/data");

        let prepared = prepare(&config("/data", "/tmp/_files"), &fs).unwrap();

        assert_eq!(prepared.root, PathBuf::from("/data"));
        assert_eq!(prepared.staging_dir, PathBuf::from("/tmp/_files"));
        assert!(prepared.filter.is_excluded(std::path::Path::new("/tmp/_files/x")));
        assert!(!prepared.filter.is_excluded(std::path::Path::new("/tmp/other")));
    }

    #[test]
    fn missing_root_is_a_root_walk_error() {
        let fs = MockFileSystem::new();
        let err = prepare(&config("/missing", "/staging"), &fs).unwrap_err();
        assert!(matches!(err, TreeMirrorError::Walk(WalkError::Root { .. })));
    }

    #[test]
    fn excluded_root_is_rejected() {
        let fs = MockFileSystem::new();
        fs.add_dir("/proc/self");
        let err = prepare(&config("/proc/self", "/staging"), &fs).unwrap_err();
        assert!(matches!(err, TreeMirrorError::Config(_)));
    }

    #[test]
    fn root_inside_staging_is_rejected() {
        let fs = MockFileSystem::new();
        fs.add_dir("/staging/inbox");
        let err = prepare(&config("/staging/inbox", "/staging"), &fs).unwrap_err();
        assert!(matches!(err, TreeMirrorError::Config(_)));
    }

    #[test]
    fn unusable_staging_path_is_an_init_error() {
        let fs = MockFileSystem::new();
        fs.add_dir("/data");
        fs.add_file("/staging", b"not a directory".to_vec());
        let err = prepare(&config("/data", "/staging"), &fs).unwrap_err();
        assert!(matches!(err, TreeMirrorError::Init(_)));
    }
}
