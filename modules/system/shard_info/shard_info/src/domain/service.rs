//! Domain service for INFO queries over the shard registry.

use chrono::Utc;
use shard_info_sdk::{EntryError, GetInfosQuery, InfoMeta, ShardInfo};
use std::collections::HashSet;
use std::sync::Arc;

use super::error::DomainError;
use super::key_filter::KeyFilter;
use super::registry::ShardRegistry;
use super::shard::InfoSnapshot;

/// Outcome of looking up one requested shard.
enum Resolution {
    Available(Arc<InfoSnapshot>),
    Unavailable(EntryError),
}

/// Domain service answering `get_infos` queries.
///
/// Reads only what the refresh loops already published: it never talks to a
/// shard and never triggers a refresh.
#[derive(Debug, Clone)]
pub struct InfoService {
    registry: Arc<ShardRegistry>,
}

impl InfoService {
    #[must_use]
    pub fn new(registry: Arc<ShardRegistry>) -> Self {
        Self { registry }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ShardRegistry> {
        &self.registry
    }

    /// Returns one entry per distinct requested shard.
    ///
    /// Without `allow_partial`, shards that are unknown or not polled yet fail
    /// the whole call. With it, they are answered by placeholder entries
    /// carrying an error and an infinite `info_age`.
    ///
    /// # Errors
    /// * `ShardsNotFound` - lists every unresolved id when partial results are not allowed
    /// * `InvalidKeyPattern` - a key pattern is not a valid glob
    pub fn get_infos(&self, query: &GetInfosQuery) -> Result<Vec<ShardInfo>, DomainError> {
        let filter = KeyFilter::new(query.key_patterns.as_deref())?;

        let resolved: Vec<(String, Resolution)> = self
            .requested_ids(query.shard_ids.as_deref())
            .into_iter()
            .map(|id| {
                let resolution = self.resolve(&id);
                (id, resolution)
            })
            .collect();

        if !query.allow_partial {
            let missing: Vec<String> = resolved
                .iter()
                .filter(|(_, r)| matches!(r, Resolution::Unavailable(_)))
                .map(|(id, _)| id.clone())
                .collect();
            if !missing.is_empty() {
                return Err(DomainError::ShardsNotFound(missing));
            }
        }

        let now = Utc::now();
        Ok(resolved
            .into_iter()
            .map(|(id, resolution)| match resolution {
                Resolution::Available(snapshot) => ShardInfo {
                    info: filter.apply(&snapshot.info),
                    meta: InfoMeta {
                        info_age: snapshot.age_at(now),
                        shard_identifier: id,
                        error: None,
                    },
                },
                Resolution::Unavailable(error) => ShardInfo::placeholder(&id, error),
            })
            .collect())
    }

    /// Requested ids without duplicates, or every registered id.
    fn requested_ids(&self, shard_ids: Option<&[String]>) -> Vec<String> {
        match shard_ids {
            None => self.registry.list_ids().into_iter().collect(),
            Some(ids) => {
                let mut seen = HashSet::with_capacity(ids.len());
                ids.iter()
                    .filter(|id| seen.insert(id.as_str()))
                    .cloned()
                    .collect()
            }
        }
    }

    fn resolve(&self, id: &str) -> Resolution {
        match self.registry.get(id) {
            None => Resolution::Unavailable(EntryError::shard_not_found(id)),
            Some(shard) => match shard.snapshot() {
                Some(snapshot) => Resolution::Available(snapshot),
                None => Resolution::Unavailable(EntryError::info_not_available(id)),
            },
        }
    }
}
