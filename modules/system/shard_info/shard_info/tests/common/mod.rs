#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

//! Common test utilities for shard_info integration tests

use async_trait::async_trait;
use serde_json::Value;
use shard_info::config::PollingConfig;
use shard_info::{
    ConnectionError, ConnectionProvider, InfoConnection, InfoMap, Shard, ShardRegistry,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Serves the same INFO on every call and counts INFO requests.
#[derive(Clone)]
pub struct StaticInfoProvider {
    info: InfoMap,
    pub info_calls: Arc<AtomicUsize>,
}

impl StaticInfoProvider {
    pub fn new(info: InfoMap) -> Self {
        Self {
            info,
            info_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.info_calls.load(Ordering::SeqCst)
    }
}

struct StaticConnection {
    info: InfoMap,
    info_calls: Arc<AtomicUsize>,
}

#[async_trait]
impl InfoConnection for StaticConnection {
    async fn info(&mut self) -> Result<InfoMap, ConnectionError> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.info.clone())
    }
}

#[async_trait]
impl ConnectionProvider for StaticInfoProvider {
    async fn connect(&self) -> Result<Box<dyn InfoConnection>, ConnectionError> {
        Ok(Box::new(StaticConnection {
            info: self.info.clone(),
            info_calls: Arc::clone(&self.info_calls),
        }))
    }
}

/// Never connects; shards using it stay unpolled.
pub struct RefusingProvider;

#[async_trait]
impl ConnectionProvider for RefusingProvider {
    async fn connect(&self) -> Result<Box<dyn InfoConnection>, ConnectionError> {
        Err(ConnectionError::Connect("connection refused".to_owned()))
    }
}

/// Polling fast enough for tests to observe several refreshes.
pub fn fast_polling() -> PollingConfig {
    PollingConfig {
        min_interval: Duration::from_millis(10),
        max_interval: Duration::from_millis(20),
        unpolled_retry_interval: Duration::from_millis(10),
        refresh_timeout: Duration::from_secs(1),
        ..PollingConfig::default()
    }
}

pub fn info_from(pairs: &[(&str, Value)]) -> InfoMap {
    let mut info: InfoMap = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), v.clone()))
        .collect();
    info.insert(
        "instantaneous_ops_per_sec".to_owned(),
        Value::from(1.0),
    );
    info
}

pub fn polled_shard(id: &str, pairs: &[(&str, Value)]) -> (Shard, StaticInfoProvider) {
    let provider = StaticInfoProvider::new(info_from(pairs));
    let shard = Shard::new(id, Arc::new(provider.clone())).with_polling(&fast_polling());
    (shard, provider)
}

pub fn unpolled_shard(id: &str) -> Shard {
    Shard::new(id, Arc::new(RefusingProvider)).with_polling(&fast_polling())
}

/// Polls `cond` every few milliseconds for up to two seconds.
pub async fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..400 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cond()
}

/// Adds a shard serving `pairs` and waits for its first snapshot.
pub async fn add_polled(registry: &ShardRegistry, id: &str, pairs: &[(&str, Value)]) -> Arc<Shard> {
    let (shard, _) = polled_shard(id, pairs);
    let shard = registry.add(shard);
    assert!(
        wait_until(|| shard.snapshot().is_some()).await,
        "shard {id} was never polled"
    );
    shard
}
