//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use buckled_context::SmartContext;
use buckled_core::BuckledConfig;
use buckled_extract::{ExtractionClient, ExtractionConfig, RateLimiter};
use buckled_store::ServiceStore;
use parking_lot::RwLock;
use tracing::info;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: BuckledConfig,
    pub store: Arc<ServiceStore>,
    pub context: SmartContext,
    pub extraction_config: RwLock<ExtractionConfig>,
    client: RwLock<Arc<ExtractionClient>>,
    limiter: RwLock<Arc<RateLimiter>>,
}

impl AppState {
    /// Build state from the data directory: loads the collaborator config
    /// and creates the process-wide rate limiter.
    pub fn new(config: BuckledConfig, store: ServiceStore) -> anyhow::Result<Self> {
        let extraction_config = ExtractionConfig::load(&config.data_paths.llm_config_file);
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(
            extraction_config.min_request_interval_ms,
        )));
        let client = ExtractionClient::from_config(&extraction_config, limiter.clone())?;
        Ok(Self::with_client(config, store, extraction_config, client, limiter))
    }

    pub fn with_client(
        config: BuckledConfig,
        store: ServiceStore,
        extraction_config: ExtractionConfig,
        client: ExtractionClient,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        let store = Arc::new(store);
        Self {
            config,
            context: SmartContext::new(store.clone()),
            store,
            extraction_config: RwLock::new(extraction_config),
            client: RwLock::new(Arc::new(client)),
            limiter: RwLock::new(limiter),
        }
    }

    /// The current extraction client. Cloned out so no lock is held across
    /// collaborator calls.
    pub fn client(&self) -> Arc<ExtractionClient> {
        self.client.read().clone()
    }

    /// Rebuild the client after a config change. The rate limiter is shared
    /// with the previous client so call spacing carries over, unless the
    /// interval itself changed.
    pub fn rebuild_client(&self, config: &ExtractionConfig) -> buckled_core::Result<()> {
        let interval = Duration::from_millis(config.min_request_interval_ms);
        let limiter = {
            let mut current = self.limiter.write();
            if current.min_interval() != interval {
                info!("Request interval changed to {}ms", interval.as_millis());
                *current = Arc::new(RateLimiter::new(interval));
            }
            current.clone()
        };
        let client = ExtractionClient::from_config(config, limiter)?;
        *self.client.write() = Arc::new(client);
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn limiter(&self) -> Arc<RateLimiter> {
        self.limiter.read().clone()
    }
}
