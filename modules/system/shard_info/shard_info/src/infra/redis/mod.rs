//! Redis implementation of the shard connection capabilities.

mod info_parser;
mod provider;

pub use info_parser::parse_info;
pub use provider::{RedisConnectionProvider, RedisInfoConnection};
