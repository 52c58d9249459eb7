// src/engine/runtime.rs

use std::fmt;
use std::future::Future;
use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::engine::MonitorStats;
use crate::engine::event_handlers::handle_record;
use crate::errors::{Result, TreeMirrorError};
use crate::mirror::FileMirror;
use crate::watch::filter::ExclusionFilter;
use crate::watch::registry::WatchRegistry;
use crate::watch::source::{EventBatch, EventSource};
use crate::watch::walker::{DirectoryWalker, WalkSummary};

/// The long-running event loop.
///
/// A `Monitor` only exists once the initial walk has succeeded, so holding
/// one means the loop is running; [`Monitor::run`] consumes it and returns
/// once it has terminated and every watch has been released.
///
/// Everything happens on one task. The only await point is the wait for the
/// next batch; records, including the recursive walk for a new directory,
/// are handled synchronously in delivery order. While a large walk runs no
/// further batches are drained, so a burst can overflow the kernel queue.
/// That surfaces as an overflow record and is logged, not recovered.
pub struct Monitor<S: EventSource, M: FileMirror> {
    registry: WatchRegistry<S>,
    filter: ExclusionFilter,
    mirror: M,
    stats: MonitorStats,
}

impl<S: EventSource, M: FileMirror> fmt::Debug for Monitor<S, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("registry", &self.registry)
            .field("filter", &self.filter)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<S: EventSource, M: FileMirror> Monitor<S, M> {
    /// Walk `root` once to populate the registry.
    ///
    /// Fails if `root` cannot be traversed at all; problems further down the
    /// tree only reduce coverage.
    pub fn start(
        mut registry: WatchRegistry<S>,
        filter: ExclusionFilter,
        mirror: M,
        root: &Path,
    ) -> Result<(Self, WalkSummary)> {
        let summary = DirectoryWalker::new(&filter).install(&mut registry, root)?;

        info!("monitoring directory tree starting at: {}", root.display());
        info!("number of watches set: {}", registry.size());

        let mut stats = MonitorStats::default();
        if summary.exhausted {
            stats.registry_full += 1;
            warn!(
                "watch capacity ({}) exhausted during initial walk; coverage is partial",
                registry.capacity()
            );
        }

        let monitor = Self {
            registry,
            filter,
            mirror,
            stats,
        };
        Ok((monitor, summary))
    }

    /// Drain batches until `shutdown` resolves or the source fails.
    ///
    /// A read failure is fatal and returned as [`TreeMirrorError::Read`].
    /// Either way every watch is released before returning.
    pub async fn run<F>(mut self, shutdown: F) -> Result<MonitorStats>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let outcome = loop {
            tokio::select! {
                biased;

                () = &mut shutdown => {
                    info!("shutdown requested");
                    break Ok(());
                }
                batch = self.registry.source_mut().next_batch() => match batch {
                    Ok(batch) => self.handle_batch(batch),
                    Err(err) => {
                        error!("failed to read from event source: {err}");
                        break Err(TreeMirrorError::Read(err));
                    }
                },
            }
        };

        self.stats.watches_released = self.registry.release_all() as u64;
        info!("released {} watches", self.stats.watches_released);

        outcome.map(|()| self.stats)
    }

    /// Process one batch, record by record, in order.
    pub fn handle_batch(&mut self, batch: EventBatch<S::Handle>) {
        self.stats.batches += 1;
        debug!(records = batch.len(), "processing batch");

        for event in batch {
            handle_record(
                &mut self.registry,
                &self.filter,
                &self.mirror,
                &mut self.stats,
                event,
            );
        }
    }

    pub fn registry(&self) -> &WatchRegistry<S> {
        &self.registry
    }

    pub fn filter(&self) -> &ExclusionFilter {
        &self.filter
    }

    pub fn mirror(&self) -> &M {
        &self.mirror
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats
    }
}
