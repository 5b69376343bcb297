//! Discovery sources feeding the shard registry.

mod local_watcher;
mod scanner;

pub use local_watcher::LocalShardWatcher;
pub use scanner::{LocalRedisScanner, ShardScanner};
