//! Finding shards running on the local machine.

use parking_lot::Mutex;
use std::sync::Arc;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};
use tracing::warn;

use crate::config::PollingConfig;
use crate::domain::shard::Shard;
use crate::infra::redis::RedisConnectionProvider;

/// Reports the shards currently observable by a discovery source.
///
/// `scan` may block; watchers call it off the async executor.
pub trait ShardScanner: Send + Sync {
    /// Freshly built, not yet started shards for everything observed now.
    /// Ids must be stable across calls for the same shard.
    fn scan(&self) -> Vec<Shard>;
}

const REDIS_PROCESS_NAME: &str = "redis-server";

/// Scans the local process table for `redis-server` processes.
///
/// The PID is the shard id. The listening endpoint is read from the process
/// title, which Redis rewrites to `redis-server <host>:<port>`. The process
/// running this scanner needs permission to read other processes' command
/// lines; processes it cannot inspect are skipped.
pub struct LocalRedisScanner {
    system: Mutex<System>,
    polling: PollingConfig,
}

impl LocalRedisScanner {
    #[must_use]
    pub fn new(polling: PollingConfig) -> Self {
        Self {
            system: Mutex::new(System::new()),
            polling,
        }
    }

    fn shard_for(&self, pid: u32, cmd: &[String]) -> Option<Shard> {
        let Some((host, port)) = parse_endpoint(cmd) else {
            warn!(pid, "failed to get connection parameters for redis-server");
            return None;
        };
        match RedisConnectionProvider::new(&host, port) {
            Ok(provider) => Some(
                Shard::new(pid.to_string(), Arc::new(provider)).with_polling(&self.polling),
            ),
            Err(e) => {
                warn!(pid, host = %host, port, error = %e, "rejected redis-server endpoint");
                None
            }
        }
    }
}

impl ShardScanner for LocalRedisScanner {
    fn scan(&self) -> Vec<Shard> {
        let mut system = self.system.lock();
        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_cmd(UpdateKind::Always),
        );

        system
            .processes()
            .iter()
            .filter(|(_, process)| process.name() == REDIS_PROCESS_NAME)
            .filter_map(|(pid, process)| {
                let cmd: Vec<String> = process
                    .cmd()
                    .iter()
                    .map(|arg| arg.to_string_lossy().into_owned())
                    .collect();
                self.shard_for(pid.as_u32(), &cmd)
            })
            .collect()
    }
}

/// Extract `(host, port)` from a `redis-server` command line.
///
/// Wildcard bind addresses are mapped to loopback.
fn parse_endpoint(cmd: &[String]) -> Option<(String, u16)> {
    cmd.iter()
        .flat_map(|arg| arg.split_whitespace())
        .find_map(|token| {
            let (host, port) = token.rsplit_once(':')?;
            let port = port.parse::<u16>().ok()?;
            let host = host.trim_start_matches('[').trim_end_matches(']');
            let host = match host {
                "" | "*" | "0.0.0.0" => "127.0.0.1",
                "::" | "::*" => "::1",
                other => other,
            };
            Some((host.to_owned(), port))
        })
}
