#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod api;
pub mod error;
pub mod models;

pub use api::ShardInfoClient;
pub use error::ShardInfoError;
pub use models::{
    EntryError, GetInfosQuery, INFINITE_INFO_AGE, InfoMap, InfoMeta, ShardInfo, UnavailableKind,
};
