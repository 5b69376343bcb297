//! Shard Registry - tracks every live shard and owns its refresh task

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::shard::Shard;

/// Directory of live shards, keyed by shard id.
///
/// Discovery sources add and remove shards; the query service reads them.
/// Inserting a shard starts its refresh task and removing it stops the task,
/// both while the id's entry is held, so the registry never points at a
/// stopped shard and never runs two tasks for one id.
///
/// All refresh tasks run under a token owned by the registry, so dropping the
/// registry stops every remaining shard.
pub struct ShardRegistry {
    shards: DashMap<String, Arc<Shard>>,
    cancel: CancellationToken,
}

impl fmt::Debug for ShardRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardRegistry")
            .field("shards_count", &self.shards.len())
            .finish_non_exhaustive()
    }
}

impl ShardRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            shards: DashMap::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Insert or replace a shard and start its refresh task.
    ///
    /// A shard already registered under the same id is stopped first.
    /// Must be called from within a Tokio runtime.
    pub fn add(&self, shard: Shard) -> Arc<Shard> {
        let shard = Arc::new(shard);
        match self.shards.entry(shard.id().to_owned()) {
            Entry::Occupied(mut entry) => {
                let replaced = entry.insert(Arc::clone(&shard));
                replaced.stop();
                shard.start(&self.cancel);
                debug!(shard_id = %shard.id(), "replaced shard");
            }
            Entry::Vacant(entry) => {
                shard.start(&self.cancel);
                entry.insert(Arc::clone(&shard));
                debug!(shard_id = %shard.id(), "added shard");
            }
        }
        shard
    }

    /// Remove a shard and stop its refresh task. Returns `false` if absent.
    pub fn remove(&self, id: &str) -> bool {
        let Entry::Occupied(entry) = self.shards.entry(id.to_owned()) else {
            return false;
        };
        entry.get().stop();
        entry.remove();
        debug!(shard_id = %id, "removed shard");
        true
    }

    /// Look up a shard by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<Shard>> {
        self.shards.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Point-in-time set of registered ids.
    #[must_use]
    pub fn list_ids(&self) -> HashSet<String> {
        self.shards.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Remove and stop every shard.
    pub fn clear(&self) {
        self.shards.retain(|_, shard| {
            shard.stop();
            false
        });
        debug!("cleared shard registry");
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.shards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }
}

impl Default for ShardRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ShardRegistry {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
