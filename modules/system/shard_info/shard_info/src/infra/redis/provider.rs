use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{Client, RedisError};
use shard_info_sdk::InfoMap;

use super::info_parser::parse_info;
use crate::domain::connection::{ConnectionError, ConnectionProvider, InfoConnection};

/// Opens connections to one Redis server.
///
/// Building the provider only validates the address; the TCP connection is
/// made by [`ConnectionProvider::connect`].
#[derive(Debug, Clone)]
pub struct RedisConnectionProvider {
    client: Client,
}

impl RedisConnectionProvider {
    /// # Errors
    /// Returns `ConnectionError::Connect` if the address is rejected.
    pub fn new(host: &str, port: u16) -> Result<Self, ConnectionError> {
        let client = Client::open((host, port)).map_err(map_redis_error)?;
        Ok(Self { client })
    }

    /// Accepts `redis://host:port/db` URLs.
    ///
    /// # Errors
    /// Returns `ConnectionError::Connect` for malformed URLs.
    pub fn from_url(url: &str) -> Result<Self, ConnectionError> {
        let client = Client::open(url).map_err(map_redis_error)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ConnectionProvider for RedisConnectionProvider {
    async fn connect(&self) -> Result<Box<dyn InfoConnection>, ConnectionError> {
        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(map_redis_error)?;
        Ok(Box::new(RedisInfoConnection { conn }))
    }
}

pub struct RedisInfoConnection {
    conn: MultiplexedConnection,
}

#[async_trait]
impl InfoConnection for RedisInfoConnection {
    async fn info(&mut self) -> Result<InfoMap, ConnectionError> {
        let reply: String = redis::cmd("INFO")
            .query_async(&mut self.conn)
            .await
            .map_err(map_redis_error)?;
        Ok(parse_info(&reply))
    }
}

fn map_redis_error(e: RedisError) -> ConnectionError {
    if e.is_io_error() || e.is_connection_refusal() || e.is_connection_dropped() || e.is_timeout()
    {
        ConnectionError::Connect(e.to_string())
    } else {
        ConnectionError::Protocol(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_without_connecting() {
        assert!(RedisConnectionProvider::new("127.0.0.1", 1).is_ok());
        assert!(RedisConnectionProvider::from_url("redis://127.0.0.1:6379/0").is_ok());
    }

    #[test]
    fn rejects_malformed_url() {
        assert!(RedisConnectionProvider::from_url("not a url").is_err());
    }

    #[tokio::test]
    async fn connect_failure_is_a_connect_error() {
        // port 1 is reserved and never runs redis
        let provider = RedisConnectionProvider::new("127.0.0.1", 1).unwrap();
        let result = provider.connect().await;
        assert!(matches!(result, Err(ConnectionError::Connect(_))));
    }
}
