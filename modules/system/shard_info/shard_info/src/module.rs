use std::sync::Arc;
use tracing::info;

use crate::config::{ConfigError, PollingConfig, ShardInfoConfig};
use crate::discovery::{LocalRedisScanner, LocalShardWatcher, ShardScanner};
use crate::domain::connection::ConnectionProvider;
use crate::domain::registry::ShardRegistry;
use crate::domain::service::InfoService;
use crate::domain::shard::Shard;
use crate::local_client::ShardInfoLocalClient;
use shard_info_sdk::ShardInfoClient;

/// Shard Info Module
///
/// Owns the shard registry, the query service and, when enabled, the local
/// `redis-server` watcher. Other discovery sources register shards through
/// [`registry`](Self::registry); consumers query through
/// [`client`](Self::client).
pub struct ShardInfoModule {
    config: ShardInfoConfig,
    registry: Arc<ShardRegistry>,
    service: InfoService,
    watcher: Option<LocalShardWatcher>,
}

impl ShardInfoModule {
    /// Validates `config` and starts the module. Must be called from within a
    /// Tokio runtime.
    ///
    /// # Errors
    /// Returns `ConfigError` if the configuration is inconsistent.
    pub fn init(config: ShardInfoConfig) -> Result<Self, ConfigError> {
        let scanner = Arc::new(LocalRedisScanner::new(config.polling.clone()));
        Self::init_with_scanner(config, scanner)
    }

    /// Like [`init`](Self::init), with a custom scanner driving the watcher.
    ///
    /// # Errors
    /// Returns `ConfigError` if the configuration is inconsistent.
    pub fn init_with_scanner(
        config: ShardInfoConfig,
        scanner: Arc<dyn ShardScanner>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let registry = Arc::new(ShardRegistry::new());
        let service = InfoService::new(Arc::clone(&registry));
        let watcher = config.local_watcher.enabled.then(|| {
            LocalShardWatcher::spawn(
                Arc::clone(&registry),
                scanner,
                config.local_watcher.clone(),
            )
        });

        info!(
            local_watcher = watcher.is_some(),
            "Shard info module initialized"
        );
        Ok(Self {
            config,
            registry,
            service,
            watcher,
        })
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ShardRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn service(&self) -> &InfoService {
        &self.service
    }

    #[must_use]
    pub fn client(&self) -> Arc<dyn ShardInfoClient> {
        Arc::new(ShardInfoLocalClient::new(self.service.clone()))
    }

    #[must_use]
    pub fn polling(&self) -> &PollingConfig {
        &self.config.polling
    }

    /// Builds a shard using the module's polling configuration.
    #[must_use]
    pub fn new_shard(&self, id: impl Into<String>, provider: Arc<dyn ConnectionProvider>) -> Shard {
        Shard::new(id, provider).with_polling(&self.config.polling)
    }

    /// Stops discovery and every shard refresh.
    pub async fn shutdown(self) {
        match self.watcher {
            Some(watcher) => watcher.stop().await,
            None => self.registry.clear(),
        }
        info!("Shard info module stopped");
    }
}
