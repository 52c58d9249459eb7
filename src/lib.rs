// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod mirror;
pub mod types;
pub mod watch;

use std::future::Future;

use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::{MonitorConfig, Prepared, RawMonitorConfig, prepare};
use crate::engine::{Monitor, MonitorStats};
use crate::errors::{Result, TreeMirrorError};
use crate::fs::RealFileSystem;
use crate::mirror::StagingMirror;
use crate::types::Backend;
use crate::watch::{EventSource, NotifySource, WatchRegistry};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config validation and path resolution
/// - the notification backend
/// - initial walk and event loop
/// - Ctrl-C / SIGTERM handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = MonitorConfig::try_from(RawMonitorConfig::from(&args))?;
    let prepared = prepare(&cfg, &RealFileSystem)?;

    info!("starting file monitoring (excluding: {})", prepared.filter);
    info!("copying new files to: {}", prepared.staging_dir.display());

    let stats = match cfg.backend {
        Backend::Inotify => run_inotify(&cfg, prepared).await?,
        Backend::Notify => {
            let source = NotifySource::new().map_err(|err| {
                TreeMirrorError::Init(format!("failed to create notify watcher: {err}"))
            })?;
            run_with(source, cfg.max_watches, prepared, shutdown_signal()).await?
        }
    };

    info!(
        "monitor stopped: {} files mirrored, {} mirror failures, {} overflows",
        stats.files_mirrored, stats.mirror_failures, stats.overflows
    );
    Ok(())
}

#[cfg(target_os = "linux")]
async fn run_inotify(cfg: &MonitorConfig, prepared: Prepared) -> Result<MonitorStats> {
    let source = crate::watch::InotifySource::new()
        .map_err(|err| TreeMirrorError::Init(format!("failed to initialise inotify: {err}")))?;
    run_with(source, cfg.max_watches, prepared, shutdown_signal()).await
}

#[cfg(not(target_os = "linux"))]
async fn run_inotify(_cfg: &MonitorConfig, _prepared: Prepared) -> Result<MonitorStats> {
    Err(TreeMirrorError::Init(
        "the inotify backend is only available on Linux; use --backend notify".to_string(),
    ))
}

/// Walk the prepared root with `source` and run until `shutdown` resolves.
///
/// Copies go to the real filesystem under `prepared.staging_dir`.
pub async fn run_with<S, F>(
    source: S,
    max_watches: usize,
    prepared: Prepared,
    shutdown: F,
) -> Result<MonitorStats>
where
    S: EventSource,
    F: Future<Output = ()>,
{
    let Prepared {
        root,
        staging_dir,
        filter,
    } = prepared;

    let registry = WatchRegistry::with_capacity(source, max_watches);
    let mirror = StagingMirror::new(RealFileSystem, staging_dir);
    let (monitor, _summary) = Monitor::start(registry, filter, mirror, &root)?;

    monitor.run(shutdown).await
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
