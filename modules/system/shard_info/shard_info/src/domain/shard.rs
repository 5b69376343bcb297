//! A tracked shard and its background INFO refresh loop.

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use shard_info_sdk::{INFINITE_INFO_AGE, InfoMap};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::connection::{ConnectionError, ConnectionProvider, InfoConnection};
use super::poll_policy::{LoadScaledInterval, PollIntervalPolicy};
use crate::config::PollingConfig;

/// INFO taken from a shard, published as one unit.
#[derive(Debug, Clone)]
pub struct InfoSnapshot {
    pub info: InfoMap,
    pub taken_at: DateTime<Utc>,
    /// Delay until the next refresh, derived from `info`.
    pub poll_interval: Duration,
}

impl InfoSnapshot {
    /// Seconds elapsed between `taken_at` and `now`, never negative.
    #[must_use]
    pub fn age_at(&self, now: DateTime<Utc>) -> f64 {
        now.signed_duration_since(self.taken_at)
            .to_std()
            .map_or(0.0, |d| d.as_secs_f64())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShardState {
    /// No INFO was ever retrieved.
    Unpolled,
    /// Holds the INFO of the last successful refresh.
    Fresh,
}

#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("refresh timed out after {0:?}")]
    TimedOut(Duration),
}

struct PollSettings {
    policy: Arc<dyn PollIntervalPolicy>,
    unpolled_retry: Duration,
    refresh_timeout: Duration,
}

impl From<&PollingConfig> for PollSettings {
    fn from(cfg: &PollingConfig) -> Self {
        Self {
            policy: Arc::new(LoadScaledInterval::from(cfg)),
            unpolled_retry: cfg.unpolled_retry_interval,
            refresh_timeout: cfg.refresh_timeout,
        }
    }
}

enum TaskSlot {
    Idle,
    Running {
        cancel: CancellationToken,
        handle: JoinHandle<()>,
    },
    Stopped,
}

/// One Redis-compatible instance tracked by a [`ShardRegistry`].
///
/// A shard owns its connection provider, the latest INFO snapshot and the
/// background task refreshing it. The task is started when the shard is
/// added to a registry and stopped for good when it is removed; a stopped
/// shard never polls again.
///
/// [`ShardRegistry`]: super::registry::ShardRegistry
pub struct Shard {
    id: String,
    provider: Arc<dyn ConnectionProvider>,
    connection: tokio::sync::Mutex<Option<Box<dyn InfoConnection>>>,
    snapshot: ArcSwapOption<InfoSnapshot>,
    settings: PollSettings,
    task: Mutex<TaskSlot>,
}

impl fmt::Debug for Shard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shard")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("refreshing", &self.is_refreshing())
            .finish_non_exhaustive()
    }
}

impl Shard {
    /// Creates an unpolled shard. No connection is made until the first refresh.
    #[must_use]
    pub fn new(id: impl Into<String>, provider: Arc<dyn ConnectionProvider>) -> Self {
        Self {
            id: id.into(),
            provider,
            connection: tokio::sync::Mutex::new(None),
            snapshot: ArcSwapOption::empty(),
            settings: PollSettings::from(&PollingConfig::default()),
            task: Mutex::new(TaskSlot::Idle),
        }
    }

    /// Applies intervals, timeout and the default load-scaled policy from `cfg`.
    #[must_use]
    pub fn with_polling(mut self, cfg: &PollingConfig) -> Self {
        self.settings = PollSettings::from(cfg);
        self
    }

    /// Replaces the poll interval policy.
    #[must_use]
    pub fn with_poll_policy(mut self, policy: Arc<dyn PollIntervalPolicy>) -> Self {
        self.settings.policy = policy;
        self
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn state(&self) -> ShardState {
        if self.snapshot.load().is_some() {
            ShardState::Fresh
        } else {
            ShardState::Unpolled
        }
    }

    /// Latest INFO snapshot, if any. Never waits for a running refresh.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<InfoSnapshot>> {
        self.snapshot.load_full()
    }

    /// Seconds since the last successful refresh, or [`INFINITE_INFO_AGE`]
    /// while unpolled.
    #[must_use]
    pub fn current_info_age(&self) -> f64 {
        self.snapshot()
            .map_or(INFINITE_INFO_AGE, |s| s.age_at(Utc::now()))
    }

    /// Poll interval computed from the latest snapshot.
    #[must_use]
    pub fn poll_interval(&self) -> Option<Duration> {
        self.snapshot().map(|s| s.poll_interval)
    }

    /// Whether the refresh task is running and has not been stopped.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        matches!(&*self.task.lock(), TaskSlot::Running { handle, .. } if !handle.is_finished())
    }

    /// Whether the shard was stopped by its registry.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        matches!(&*self.task.lock(), TaskSlot::Stopped)
    }

    /// Fetch INFO once and publish it.
    ///
    /// Concurrent calls are serialized, so at most one request is in flight
    /// per shard. On failure the previous snapshot stays untouched and the
    /// cached connection is dropped so the next attempt reconnects.
    ///
    /// # Errors
    /// Returns `RefreshError` when connecting, the INFO command or the
    /// timeout fails.
    pub async fn refresh(&self) -> Result<(), RefreshError> {
        let mut cached = self.connection.lock().await;
        let attempt = async {
            let mut conn = match cached.take() {
                Some(conn) => conn,
                None => {
                    debug!(shard_id = %self.id, "connecting to shard");
                    self.provider.connect().await?
                }
            };
            let info = conn.info().await?;
            *cached = Some(conn);
            Ok::<_, ConnectionError>(info)
        };

        let timeout = self.settings.refresh_timeout;
        let info = tokio::time::timeout(timeout, attempt)
            .await
            .map_err(|_| RefreshError::TimedOut(timeout))??;
        self.publish(info);
        Ok(())
    }

    fn publish(&self, info: InfoMap) {
        let poll_interval = self.settings.policy.interval_for(&info);
        self.snapshot.store(Some(Arc::new(InfoSnapshot {
            info,
            taken_at: Utc::now(),
            poll_interval,
        })));
    }

    fn next_delay(&self) -> Duration {
        self.poll_interval()
            .unwrap_or(self.settings.unpolled_retry)
    }

    /// Spawns the refresh loop under a child of `parent`. No-op unless idle.
    pub(crate) fn start(self: &Arc<Self>, parent: &CancellationToken) {
        let mut slot = self.task.lock();
        if !matches!(*slot, TaskSlot::Idle) {
            return;
        }
        let cancel = parent.child_token();
        let handle = tokio::spawn(Arc::clone(self).run(cancel.clone()));
        *slot = TaskSlot::Running { cancel, handle };
    }

    /// Cancels the refresh loop. The shard cannot be started again.
    pub(crate) fn stop(&self) {
        let previous = std::mem::replace(&mut *self.task.lock(), TaskSlot::Stopped);
        if let TaskSlot::Running { cancel, .. } = previous {
            cancel.cancel();
            debug!(shard_id = %self.id, "shard refresh stopped");
        }
    }

    async fn run(self: Arc<Self>, cancel: CancellationToken) {
        debug!(shard_id = %self.id, "shard refresh started");
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                result = self.refresh() => {
                    if let Err(e) = result {
                        warn!(shard_id = %self.id, error = %e, "failed to refresh shard info");
                    }
                }
            }

            let delay = self.next_delay();
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(delay) => {}
            }
        }
        debug!(shard_id = %self.id, "shard refresh loop exited");
    }
}
