pub mod connection;
pub mod error;
pub mod key_filter;
pub mod poll_policy;
pub mod registry;
pub mod service;
pub mod shard;
