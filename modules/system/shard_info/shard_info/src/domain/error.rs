use shard_info_sdk::ShardInfoError;

/// Domain-level errors for the shard info module
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("Shards not found: {}", .0.join(", "))]
    ShardsNotFound(Vec<String>),

    #[error("Invalid key pattern '{pattern}': {reason}")]
    InvalidKeyPattern { pattern: String, reason: String },
}

impl From<DomainError> for ShardInfoError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::ShardsNotFound(ids) => Self::NotFound(ids),
            DomainError::InvalidKeyPattern { pattern, reason } => {
                Self::InvalidKeyPattern { pattern, reason }
            }
        }
    }
}
