//! Capabilities a shard needs from the underlying store client.

use async_trait::async_trait;
use shard_info_sdk::InfoMap;

/// Failure while talking to a shard. Never reaches query callers.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("failed to connect: {0}")]
    Connect(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// An established connection able to fetch the shard's INFO.
#[async_trait]
pub trait InfoConnection: Send {
    /// Issue the status command and return its parsed reply.
    async fn info(&mut self) -> Result<InfoMap, ConnectionError>;
}

/// Produces connections to one shard.
///
/// Invoked lazily by the shard's refresh loop, once for the first refresh
/// and again only after the cached connection failed.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn InfoConnection>, ConnectionError>;
}
