use crate::core::catalog::CatalogBuilder;
use crate::core::invoker::DiscoveryInvoker;
use crate::core::{CommandRunner, ConfigProvider, ServiceCatalog};
use crate::utils::error::Result;
use std::sync::Arc;
use std::time::Instant;

/// Invoke, parse, filter. One fresh catalog per call; nothing is cached.
pub struct DiscoveryService {
    invoker: DiscoveryInvoker,
    builder: CatalogBuilder,
}

impl DiscoveryService {
    pub fn new(invoker: DiscoveryInvoker, builder: CatalogBuilder) -> Self {
        Self { invoker, builder }
    }

    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C, runner: Arc<dyn CommandRunner>) -> Self {
        let mut invoker = DiscoveryInvoker::new(runner, config.command().to_vec(), config.timeout());
        if config.serialize_invocations() {
            invoker = invoker.serialized();
        }
        let builder = CatalogBuilder::new(config.scheme(), config.filter_policy());

        Self::new(invoker, builder)
    }

    pub async fn discover(&self) -> Result<ServiceCatalog> {
        let started = Instant::now();

        let raw = match self.invoker.invoke().await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(kind = ?e.kind(), "Discovery command failed: {}", e);
                return Err(e);
            }
        };
        tracing::debug!("Discovery command produced {} bytes", raw.len());

        let catalog = match self.builder.build(&raw) {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::warn!(kind = ?e.kind(), "Discovery output rejected: {}", e);
                return Err(e);
            }
        };

        tracing::info!(
            services = catalog.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Service catalog built"
        );
        Ok(catalog)
    }
}
