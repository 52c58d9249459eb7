// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::mirror::DEFAULT_STAGING_DIR;
use crate::types::Backend;
use crate::watch::DEFAULT_MAX_WATCHES;

/// Command-line arguments for `treemirror`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "treemirror",
    version,
    about = "Watch a directory tree and mirror newly created files into a staging directory.",
    long_about = None
)]
pub struct CliArgs {
    /// Root of the directory tree to monitor.
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Directory that receives copies of new files.
    ///
    /// Created if missing, and never watched itself.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_STAGING_DIR)]
    pub staging_dir: PathBuf,

    /// Additional path prefix to exclude (repeatable).
    #[arg(long = "exclude", value_name = "PREFIX")]
    pub exclude: Vec<String>,

    /// Do not exclude /sys, /proc, /dev and /run.
    #[arg(long)]
    pub no_default_excludes: bool,

    /// Maximum number of directories watched at once.
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_WATCHES)]
    pub max_watches: usize,

    /// Notification backend.
    #[arg(long, value_enum, value_name = "BACKEND", default_value_t = Backend::default())]
    pub backend: Backend,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TREEMIRROR_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Parse `std::env::args`, leaving error reporting to the caller.
pub fn try_parse() -> Result<CliArgs, clap::Error> {
    CliArgs::try_parse()
}
