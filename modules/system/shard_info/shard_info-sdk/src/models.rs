//! Response and query models for the `shard_info` module.

use std::fmt;

/// A parsed INFO reply: key to typed value (integer, float, string or a
/// nested map for `k=v,k=v` values).
pub type InfoMap = serde_json::Map<String, serde_json::Value>;

/// `info_age` reported for shards that have no INFO at all.
pub const INFINITE_INFO_AGE: f64 = f64::MAX;

/// Why a response entry carries no INFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnavailableKind {
    /// No shard with the requested id is tracked.
    ShardNotFound,
    /// The shard is tracked but has never been polled successfully.
    InfoNotAvailable,
}

/// Error attached to a placeholder entry in a partial response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryError {
    pub kind: UnavailableKind,
    pub message: String,
}

impl EntryError {
    #[must_use]
    pub fn shard_not_found(shard_id: &str) -> Self {
        Self {
            kind: UnavailableKind::ShardNotFound,
            message: format!("shard {shard_id} not found"),
        }
    }

    #[must_use]
    pub fn info_not_available(shard_id: &str) -> Self {
        Self {
            kind: UnavailableKind::InfoNotAvailable,
            message: format!("info for shard {shard_id} not available"),
        }
    }
}

impl fmt::Display for EntryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Metadata block attached to every response entry.
#[derive(Debug, Clone, PartialEq)]
pub struct InfoMeta {
    pub shard_identifier: String,
    /// Seconds since the INFO was taken, or [`INFINITE_INFO_AGE`].
    pub info_age: f64,
    /// Present only on placeholder entries.
    pub error: Option<EntryError>,
}

/// One entry of a `get_infos` response.
#[derive(Debug, Clone, PartialEq)]
pub struct ShardInfo {
    /// INFO keys that passed the key filter. Empty for placeholders.
    pub info: InfoMap,
    pub meta: InfoMeta,
}

impl ShardInfo {
    /// Builds an entry with no INFO, standing in for a shard that could not be
    /// resolved.
    #[must_use]
    pub fn placeholder(shard_id: &str, error: EntryError) -> Self {
        Self {
            info: InfoMap::new(),
            meta: InfoMeta {
                shard_identifier: shard_id.to_owned(),
                info_age: INFINITE_INFO_AGE,
                error: Some(error),
            },
        }
    }

    #[must_use]
    pub fn shard_id(&self) -> &str {
        &self.meta.shard_identifier
    }

    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.meta.error.is_some()
    }
}

/// Query parameters for `get_infos`.
///
/// # Example
///
/// ```
/// use shard_info_sdk::GetInfosQuery;
///
/// // INFO of every tracked shard
/// let query = GetInfosQuery::default();
///
/// // Memory keys of two shards, tolerating missing ones
/// let query = GetInfosQuery::new()
///     .with_shard_ids(["1234", "5678"])
///     .with_key_patterns(["used_memory*"])
///     .with_allow_partial(true);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetInfosQuery {
    /// Shards to query. `None` selects every tracked shard.
    pub shard_ids: Option<Vec<String>>,

    /// Glob patterns selecting INFO keys. `None` keeps all keys.
    pub key_patterns: Option<Vec<String>>,

    /// Return placeholder entries instead of failing on missing shards.
    pub allow_partial: bool,
}

impl GetInfosQuery {
    /// Creates a query selecting every tracked shard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_shard_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shard_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_key_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_patterns = Some(patterns.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub const fn with_allow_partial(mut self, allow_partial: bool) -> Self {
        self.allow_partial = allow_partial;
        self
    }
}
