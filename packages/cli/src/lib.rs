// ABOUTME: Service wiring for the engage command line
// ABOUTME: Builds every service from configuration and installs logging

use std::sync::Arc;

use anyhow::{Context, Result};
use engage_config::EngageConfig;
use engage_deliveries::{ClientDirectory, DeliveryService};
use engage_notifications::Notifier;
use engage_progress::{FileProgressCache, LocalProgressCache, ProgressService};
use engage_storage::DeliverableStore;
use engage_teardown::{
    HttpIdentityProvider, IdentityProvider, TeardownOrchestrator, UnconfiguredIdentityProvider,
};
use tracing::warn;

/// Install the global subscriber. `RUST_LOG` overrides the default `info` level.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}

/// Every service the commands need, sharing one store
#[derive(Clone)]
pub struct AppContext {
    pub config: EngageConfig,
    pub store: DeliverableStore,
    pub clients: ClientDirectory,
    pub deliveries: DeliveryService,
    pub progress: ProgressService,
    pub teardown: TeardownOrchestrator,
}

impl AppContext {
    /// Open the configured database (running migrations) and build the services
    pub async fn open(config: EngageConfig) -> Result<Self> {
        let store = DeliverableStore::open(&config.storage)
            .await
            .with_context(|| {
                format!(
                    "failed to open database at {}",
                    config.storage.database_path.display()
                )
            })?;

        let cache: Arc<dyn LocalProgressCache> =
            Arc::new(FileProgressCache::new(config.progress.cache_dir.clone()));
        Ok(Self::with_store(config, store, cache))
    }

    pub fn with_store(
        config: EngageConfig,
        store: DeliverableStore,
        cache: Arc<dyn LocalProgressCache>,
    ) -> Self {
        let notifier = Notifier::from_settings(&config.notifications);

        let identity: Arc<dyn IdentityProvider> =
            match HttpIdentityProvider::from_settings(&config.teardown) {
                Some(provider) => Arc::new(provider),
                None => {
                    warn!("No identity provider configured; identities will be queued as orphans");
                    Arc::new(UnconfiguredIdentityProvider)
                }
            };

        Self {
            clients: ClientDirectory::new(store.clone()),
            deliveries: DeliveryService::new(store.clone(), notifier, config.deliveries.clone()),
            progress: ProgressService::new(store.clone(), cache),
            teardown: TeardownOrchestrator::new(store.clone(), identity, &config.teardown),
            store,
            config,
        }
    }
}
