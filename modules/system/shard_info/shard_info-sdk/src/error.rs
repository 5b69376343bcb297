/// Errors for the shard info module
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShardInfoError {
    #[error("INFO not found for shards: {}", .0.join(", "))]
    NotFound(Vec<String>),

    #[error("Invalid key pattern '{pattern}': {reason}")]
    InvalidKeyPattern { pattern: String, reason: String },

    #[error("An internal error occurred")]
    Internal,
}
