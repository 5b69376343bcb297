use crate::domain::service::InfoService;
use shard_info_sdk::{GetInfosQuery, ShardInfo, ShardInfoClient, ShardInfoError};

/// Local client implementation for the shard info module
pub struct ShardInfoLocalClient {
    service: InfoService,
}

impl ShardInfoLocalClient {
    #[must_use]
    pub fn new(service: InfoService) -> Self {
        Self { service }
    }
}

#[async_trait::async_trait]
impl ShardInfoClient for ShardInfoLocalClient {
    async fn get_infos(&self, query: GetInfosQuery) -> Result<Vec<ShardInfo>, ShardInfoError> {
        self.service.get_infos(&query).map_err(Into::into)
    }

    async fn list_shard_ids(&self) -> Result<Vec<String>, ShardInfoError> {
        Ok(self.service.registry().list_ids().into_iter().collect())
    }
}
