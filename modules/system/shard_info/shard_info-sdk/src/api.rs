//! `ShardInfoClient` trait definition.
//!
//! This trait is the public API of the `shard_info` module. Remote adapters
//! (RPC, HTTP) translate their requests into [`GetInfosQuery`] and call it.

use async_trait::async_trait;

use crate::error::ShardInfoError;
use crate::models::{GetInfosQuery, ShardInfo};

/// Public API trait for the `shard_info` module.
#[async_trait]
pub trait ShardInfoClient: Send + Sync {
    /// Return the latest INFO snapshot of every shard selected by `query`.
    ///
    /// The response holds exactly one entry per distinct requested shard id.
    /// Callers must not rely on its order.
    ///
    /// # Errors
    ///
    /// * `NotFound` - `allow_partial` is off and some requested shard is
    ///   unknown or has not been polled yet
    /// * `InvalidKeyPattern` - one of the key patterns is not a valid glob
    async fn get_infos(&self, query: GetInfosQuery) -> Result<Vec<ShardInfo>, ShardInfoError>;

    /// Ids of all currently tracked shards, in no particular order.
    async fn list_shard_ids(&self) -> Result<Vec<String>, ShardInfoError>;
}
