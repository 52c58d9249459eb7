// src/watch/filter.rs

//! Exclusion of pseudo-filesystem subtrees.

use std::fmt;
use std::path::Path;

/// Prefixes excluded unless `--no-default-excludes` is given: sysfs, the
/// process-info tree, device files and runtime state.
pub const DEFAULT_EXCLUDED_PREFIXES: &[&str] = &["/sys", "/proc", "/dev", "/run"];

/// Decides whether a path must never be watched or acted upon.
///
/// Matching is a plain byte-prefix test on the path as given: no
/// normalisation, case-sensitive, and `/proc` also covers `/procfs-backup`.
/// Callers are expected to pass canonical absolute paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionFilter {
    prefixes: Vec<String>,
}

impl ExclusionFilter {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// Filter over [`DEFAULT_EXCLUDED_PREFIXES`].
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_EXCLUDED_PREFIXES.iter().copied())
    }

    /// Append a prefix; order of existing prefixes is kept.
    pub fn push(&mut self, prefix: impl Into<String>) {
        let prefix = prefix.into();
        if !self.prefixes.contains(&prefix) {
            self.prefixes.push(prefix);
        }
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        let bytes = path.as_os_str().as_encoded_bytes();
        self.prefixes
            .iter()
            .any(|prefix| bytes.starts_with(prefix.as_bytes()))
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}

impl fmt::Display for ExclusionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefixes.is_empty() {
            return f.write_str("nothing");
        }
        f.write_str(&self.prefixes.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_prefixes_cover_pseudo_filesystems() {
        let filter = ExclusionFilter::with_defaults();
        assert!(filter.is_excluded(Path::new("/proc/1234")));
        assert!(filter.is_excluded(Path::new("/sys/class/net")));
        assert!(filter.is_excluded(Path::new("/dev")));
        assert!(filter.is_excluded(Path::new("/run/user/1000")));
        assert!(!filter.is_excluded(Path::new("/data/a")));
        assert!(!filter.is_excluded(Path::new("/")));
    }

    #[test]
    fn matching_is_a_raw_string_prefix() {
        let filter = ExclusionFilter::new(["/proc"]);
        // No component awareness: a sibling sharing the prefix is excluded too.
        assert!(filter.is_excluded(Path::new("/process")));
        // Case-sensitive, no normalisation.
        assert!(!filter.is_excluded(Path::new("/PROC/1")));
        assert!(!filter.is_excluded(Path::new("/./proc/1")));
    }

    #[test]
    fn empty_filter_excludes_nothing() {
        let filter = ExclusionFilter::default();
        assert!(!filter.is_excluded(Path::new("/proc")));
        assert_eq!(filter.to_string(), "nothing");
    }

    #[test]
    fn push_keeps_order_and_skips_duplicates() {
        let mut filter = ExclusionFilter::new(["/sys", "/proc"]);
        filter.push("/tmp/_files");
        filter.push("/proc");
        assert_eq!(filter.prefixes(), ["/sys", "/proc", "/tmp/_files"]);
        assert_eq!(filter.to_string(), "/sys, /proc, /tmp/_files");
    }
}
