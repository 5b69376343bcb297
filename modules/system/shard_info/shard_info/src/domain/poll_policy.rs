//! Adaptive poll interval computation.

use serde_json::Value;
use shard_info_sdk::InfoMap;
use std::time::Duration;

use crate::config::PollingConfig;

/// Maps the latest INFO of a shard to the delay before its next refresh.
///
/// Implementations must be pure: the result depends only on `info`.
pub trait PollIntervalPolicy: Send + Sync {
    fn interval_for(&self, info: &InfoMap) -> Duration;
}

/// Busier shards are polled more often.
///
/// The interval shrinks linearly from `max` at zero load to `min` at
/// `full_load` and stays at `min` beyond it. INFO without a usable load
/// metric is polled at `max`.
#[derive(Debug, Clone)]
pub struct LoadScaledInterval {
    min: Duration,
    max: Duration,
    full_load: f64,
    metric: String,
}

impl LoadScaledInterval {
    #[must_use]
    pub fn new(min: Duration, max: Duration, full_load: f64, metric: impl Into<String>) -> Self {
        Self {
            min: min.min(max),
            max,
            full_load,
            metric: metric.into(),
        }
    }

    fn load(&self, info: &InfoMap) -> Option<f64> {
        let load = match info.get(&self.metric)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.parse::<f64>().ok(),
            _ => None,
        };
        // Redis prints non-finite floats as `nan` / `inf`
        load.filter(|v| v.is_finite())
    }
}

impl From<&PollingConfig> for LoadScaledInterval {
    fn from(cfg: &PollingConfig) -> Self {
        Self::new(
            cfg.min_interval,
            cfg.max_interval,
            cfg.full_load_ops_per_sec,
            cfg.load_metric.clone(),
        )
    }
}

impl Default for LoadScaledInterval {
    fn default() -> Self {
        Self::from(&PollingConfig::default())
    }
}

impl PollIntervalPolicy for LoadScaledInterval {
    fn interval_for(&self, info: &InfoMap) -> Duration {
        let Some(load) = self.load(info) else {
            return self.max;
        };
        let ratio = if self.full_load > 0.0 {
            (load / self.full_load).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let span = self.max.saturating_sub(self.min);
        self.max
            .saturating_sub(span.mul_f64(ratio))
            .clamp(self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn info_with_load(load: Value) -> InfoMap {
        let mut info = InfoMap::new();
        info.insert("instantaneous_ops_per_sec".to_owned(), load);
        info
    }

    fn policy() -> LoadScaledInterval {
        LoadScaledInterval::new(
            Duration::from_secs(1),
            Duration::from_secs(11),
            1000.0,
            "instantaneous_ops_per_sec",
        )
    }

    #[test]
    fn idle_shard_gets_max_interval() {
        assert_eq!(
            policy().interval_for(&info_with_load(json!(0))),
            Duration::from_secs(11)
        );
    }

    #[test]
    fn higher_load_shortens_interval() {
        let p = policy();
        let half = p.interval_for(&info_with_load(json!(500)));
        let busy = p.interval_for(&info_with_load(json!(900)));

        assert_eq!(half, Duration::from_secs(6));
        assert!(busy < half);
    }

    #[test]
    fn load_beyond_full_clamps_to_min() {
        assert_eq!(
            policy().interval_for(&info_with_load(json!(1_000_000))),
            Duration::from_secs(1)
        );
    }

    #[test]
    fn negative_load_clamps_to_max() {
        assert_eq!(
            policy().interval_for(&info_with_load(json!(-5.0))),
            Duration::from_secs(11)
        );
    }

    #[test]
    fn missing_or_garbage_metric_uses_max() {
        let p = policy();
        assert_eq!(p.interval_for(&InfoMap::new()), Duration::from_secs(11));
        assert_eq!(
            p.interval_for(&info_with_load(json!({"nested": 1}))),
            Duration::from_secs(11)
        );
        assert_eq!(
            p.interval_for(&info_with_load(json!("not-a-number"))),
            Duration::from_secs(11)
        );
    }

    #[test]
    fn non_finite_metric_uses_max() {
        let p = policy();
        for raw in ["nan", "inf", "-inf", "NaN", "infinity"] {
            assert_eq!(
                p.interval_for(&info_with_load(json!(raw))),
                Duration::from_secs(11),
                "metric {raw}"
            );
        }
    }

    #[test]
    fn string_metric_is_parsed() {
        assert_eq!(
            policy().interval_for(&info_with_load(json!("1000"))),
            Duration::from_secs(1)
        );
    }

    #[test]
    fn built_from_config() {
        let p = LoadScaledInterval::default();
        assert_eq!(p.interval_for(&InfoMap::new()), Duration::from_secs(10));
        assert_eq!(
            p.interval_for(&info_with_load(json!(10_000))),
            Duration::from_secs(1)
        );
    }
}
