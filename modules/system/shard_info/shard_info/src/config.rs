//! Configuration for the shard info module.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the shard info module.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShardInfoConfig {
    pub polling: PollingConfig,
    pub local_watcher: LocalWatcherConfig,
}

impl ShardInfoConfig {
    /// # Errors
    /// Returns the first inconsistency found in any section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.polling.validate()?;
        self.local_watcher.validate()
    }
}

/// Per-shard INFO polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollingConfig {
    /// Poll interval of a shard at or above `full_load_ops_per_sec`.
    #[serde(with = "humantime_duration")]
    pub min_interval: Duration,

    /// Poll interval of an idle shard.
    #[serde(with = "humantime_duration")]
    pub max_interval: Duration,

    /// Load at which the interval reaches `min_interval`.
    pub full_load_ops_per_sec: f64,

    /// INFO key holding the load metric.
    pub load_metric: String,

    /// Retry period while a shard has never been polled successfully.
    #[serde(with = "humantime_duration")]
    pub unpolled_retry_interval: Duration,

    /// Upper bound for a single connect + INFO round trip.
    #[serde(with = "humantime_duration")]
    pub refresh_timeout: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(10),
            full_load_ops_per_sec: 10_000.0,
            load_metric: "instantaneous_ops_per_sec".to_owned(),
            unpolled_retry_interval: Duration::from_secs(1),
            refresh_timeout: Duration::from_secs(5),
        }
    }
}

impl PollingConfig {
    /// # Errors
    /// Returns `ConfigError` when bounds are inverted or a duration is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("polling.min_interval", self.min_interval),
            ("polling.unpolled_retry_interval", self.unpolled_retry_interval),
            ("polling.refresh_timeout", self.refresh_timeout),
        ] {
            if value.is_zero() {
                return Err(ConfigError::ZeroDuration { field });
            }
        }
        if self.min_interval > self.max_interval {
            return Err(ConfigError::InvalidPollBounds {
                min: self.min_interval,
                max: self.max_interval,
            });
        }
        if !(self.full_load_ops_per_sec.is_finite() && self.full_load_ops_per_sec > 0.0) {
            return Err(ConfigError::InvalidFullLoad(self.full_load_ops_per_sec));
        }
        Ok(())
    }
}

/// Local `redis-server` process discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocalWatcherConfig {
    pub enabled: bool,

    /// Period between process table scans.
    #[serde(with = "humantime_duration")]
    pub scan_interval: Duration,

    /// INFO older than this is reported as suspiciously stale.
    #[serde(with = "humantime_duration")]
    pub stale_info_threshold: Duration,

    /// Run the staleness check once every this many scans.
    pub stale_check_every: u32,
}

impl Default for LocalWatcherConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            scan_interval: Duration::from_secs(1),
            stale_info_threshold: Duration::from_secs(10),
            stale_check_every: 5,
        }
    }
}

impl LocalWatcherConfig {
    /// # Errors
    /// Returns `ConfigError::ZeroDuration` for a zero scan interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan_interval.is_zero() {
            return Err(ConfigError::ZeroDuration {
                field: "local_watcher.scan_interval",
            });
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("min poll interval {min:?} exceeds max poll interval {max:?}")]
    InvalidPollBounds { min: Duration, max: Duration },

    #[error("'{field}' must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("full load must be a positive number of ops/sec, got {0}")]
    InvalidFullLoad(f64),
}

/// Serde adapter for durations written as `"500ms"`, `"5s"`, `"1m 30s"`.
mod humantime_duration {
    use serde::{Deserialize, Deserializer, Serializer, de};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.collect_str(&humantime::format_duration(*duration))
    }

    pub fn deserialize<'de, D>(d: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(d)?;
        humantime::parse_duration(&raw).map_err(de::Error::custom)
    }
}
