//! Shard Info Module
//!
//! Tracks the live Redis-compatible shards of a deployment, keeps a fresh
//! INFO snapshot of each one in the background and answers aggregated
//! queries over those snapshots.
//!
//! - Discovery sources add and remove shards in a [`ShardRegistry`]
//! - Every registered [`Shard`] polls its own INFO, faster when busier
//! - [`InfoService::get_infos`] filters INFO keys and reports how old each
//!   snapshot is, with placeholder entries for shards it cannot answer for
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

// === PUBLIC CONTRACT ===
pub use shard_info_sdk::{
    EntryError, GetInfosQuery, INFINITE_INFO_AGE, InfoMap, InfoMeta, ShardInfo, ShardInfoClient,
    ShardInfoError, UnavailableKind,
};

// === MODULE DEFINITION ===
pub mod module;
pub use module::ShardInfoModule;

pub mod config;
pub mod discovery;
pub mod domain;
pub mod infra;
pub mod local_client;

pub use domain::connection::{ConnectionError, ConnectionProvider, InfoConnection};
pub use domain::error::DomainError;
pub use domain::poll_policy::{LoadScaledInterval, PollIntervalPolicy};
pub use domain::registry::ShardRegistry;
pub use domain::service::InfoService;
pub use domain::shard::{InfoSnapshot, RefreshError, Shard, ShardState};
