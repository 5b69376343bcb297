//! Periodic reconciliation of the registry against a [`ShardScanner`].

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::scanner::ShardScanner;
use crate::config::LocalWatcherConfig;
use crate::domain::registry::ShardRegistry;
use crate::domain::shard::Shard;

/// Background task keeping a registry in sync with what a scanner sees.
///
/// Every scan adds newly observed shards and removes vanished ones; shards
/// that are still present keep running untouched. The watcher assumes it is
/// the only discovery source of its registry and clears it on [`stop`].
///
/// [`stop`]: LocalShardWatcher::stop
pub struct LocalShardWatcher {
    registry: Arc<ShardRegistry>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl LocalShardWatcher {
    /// Starts watching. Must be called from within a Tokio runtime.
    pub fn spawn(
        registry: Arc<ShardRegistry>,
        scanner: Arc<dyn ShardScanner>,
        config: LocalWatcherConfig,
    ) -> Self {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(
            Arc::clone(&registry),
            scanner,
            config,
            cancel.clone(),
        ));
        Self {
            registry,
            cancel,
            handle,
        }
    }

    /// Stops the scan loop, waits for it and removes every shard from the
    /// registry.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            warn!(error = %e, "local shard watcher task failed");
        }
        self.registry.clear();
        info!("local shard watcher stopped");
    }
}

async fn run(
    registry: Arc<ShardRegistry>,
    scanner: Arc<dyn ShardScanner>,
    config: LocalWatcherConfig,
    cancel: CancellationToken,
) {
    info!(scan_interval = ?config.scan_interval, "local shard watcher starting");
    let mut scans_since_check: u32 = 0;
    loop {
        if config.stale_check_every > 0 {
            scans_since_check += 1;
            if scans_since_check >= config.stale_check_every {
                report_stale_shards(&registry, config.stale_info_threshold);
                scans_since_check = 0;
            }
        }

        let scanner = Arc::clone(&scanner);
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            scanned = tokio::task::spawn_blocking(move || scanner.scan()) => match scanned {
                Ok(found) => reconcile(&registry, found),
                Err(e) => warn!(error = %e, "local shard scan failed"),
            },
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(config.scan_interval) => {}
        }
    }
}

/// Adds shards the registry does not know yet and removes the ones that were
/// not found.
fn reconcile(registry: &ShardRegistry, found: Vec<Shard>) {
    let published = registry.list_ids();
    let mut current = HashSet::with_capacity(found.len());
    let mut added = 0_usize;

    for shard in found {
        current.insert(shard.id().to_owned());
        if !published.contains(shard.id()) {
            registry.add(shard);
            added += 1;
        }
    }

    let mut removed = 0_usize;
    for id in published.difference(&current) {
        if registry.remove(id) {
            removed += 1;
        }
    }

    if added > 0 || removed > 0 {
        debug!(added, removed, live = current.len(), "updated local shards");
    }
}

/// Warns about every shard whose INFO is older than `threshold` and returns
/// how many there were.
fn report_stale_shards(registry: &ShardRegistry, threshold: Duration) -> usize {
    let threshold = threshold.as_secs_f64();
    let mut stale = 0;
    for id in registry.list_ids() {
        let Some(shard) = registry.get(&id) else {
            continue;
        };
        let age = shard.current_info_age();
        if age > threshold {
            stale += 1;
            match shard.snapshot() {
                Some(_) => warn!(shard_id = %id, info_age_secs = age.floor(), "stale info suspected"),
                None => warn!(shard_id = %id, "stale info suspected: shard never polled"),
            }
        }
    }
    stale
}
