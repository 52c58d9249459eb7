// src/types.rs

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;

/// Which OS notification facility feeds the monitor.
///
/// - `Inotify`: raw Linux inotify; one kernel watch per directory with
///   kernel-issued watch descriptors as handles (default on Linux).
/// - `Notify`: the portable `notify` crate, one non-recursive watch per
///   directory with locally issued handles (default elsewhere).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    Inotify,
    Notify,
}

impl Default for Backend {
    fn default() -> Self {
        if cfg!(target_os = "linux") {
            Backend::Inotify
        } else {
            Backend::Notify
        }
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inotify" => Ok(Backend::Inotify),
            "notify" => Ok(Backend::Notify),
            other => Err(format!(
                "invalid backend: {other} (expected \"inotify\" or \"notify\")"
            )),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Inotify => f.write_str("inotify"),
            Backend::Notify => f.write_str("notify"),
        }
    }
}
