//! Service wiring: catalog store, notification hub and recommendation gateway.

use std::sync::Arc;

use anyhow::Context;

use pricewatch_ai::{GeminiConfig, GeminiModel, RecommendationGateway};
use pricewatch_catalog::{CatalogStore, InMemoryCatalogStore};
use pricewatch_realtime::NotificationHub;

use crate::config::{ApiConfig, GeminiSettings, RealtimeSettings};

/// Everything request handlers and `/ws` connections share.
///
/// The hub lives here rather than in a process global, so its lifetime is the
/// server's: it is created with the services and closed on shutdown.
#[derive(Clone)]
pub struct AppServices {
    pub store: Arc<dyn CatalogStore>,
    pub hub: Arc<NotificationHub>,
    pub gateway: RecommendationGateway,
    pub realtime: RealtimeSettings,
}

impl AppServices {
    pub fn new(store: Arc<dyn CatalogStore>, gateway: RecommendationGateway) -> Self {
        Self {
            store,
            hub: Arc::new(NotificationHub::new()),
            gateway,
            realtime: RealtimeSettings::default(),
        }
    }

    /// Seeded in-memory catalog, no AI. Used by tests and local runs.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryCatalogStore::with_sample_data()),
            RecommendationGateway::disabled(),
        )
    }

    pub fn with_realtime(mut self, realtime: RealtimeSettings) -> Self {
        self.realtime = realtime;
        self
    }
}

impl std::fmt::Debug for AppServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppServices")
            .field("gateway", &self.gateway)
            .field("sessions", &self.hub.session_count())
            .field("realtime", &self.realtime)
            .finish_non_exhaustive()
    }
}

pub async fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    let store = build_store(config).await?;
    let gateway = build_gateway(config.gemini.as_ref())?;
    Ok(AppServices::new(store, gateway).with_realtime(config.realtime.clone()))
}

async fn build_store(config: &ApiConfig) -> anyhow::Result<Arc<dyn CatalogStore>> {
    if let Some(url) = config.database_url.as_deref() {
        #[cfg(feature = "postgres")]
        {
            let store = pricewatch_catalog::PgCatalogStore::connect(url)
                .await
                .context("failed to connect to DATABASE_URL")?;
            store.migrate().await.context("failed to apply catalog schema")?;
            tracing::info!("using postgres catalog store");
            return Ok(Arc::new(store));
        }
        #[cfg(not(feature = "postgres"))]
        {
            let _ = url;
            tracing::warn!(
                "USE_PERSISTENT_STORES=true but postgres feature not enabled, falling back to in-memory"
            );
        }
    }

    tracing::info!("using in-memory catalog store with sample data");
    Ok(Arc::new(InMemoryCatalogStore::with_sample_data()))
}

fn build_gateway(settings: Option<&GeminiSettings>) -> anyhow::Result<RecommendationGateway> {
    let Some(settings) = settings else {
        tracing::warn!("GEMINI_API_KEY not set; recommendations disabled");
        return Ok(RecommendationGateway::disabled());
    };

    let mut cfg = GeminiConfig::new(settings.api_key.clone());
    if let Some(model) = &settings.model {
        cfg = cfg.with_model(model.clone());
    }
    if let Some(base_url) = &settings.base_url {
        cfg = cfg.with_base_url(base_url.clone());
    }
    let model = GeminiModel::new(cfg).context("failed to build Gemini client")?;
    tracing::info!(model = %settings.model.as_deref().unwrap_or(pricewatch_ai::gemini::DEFAULT_MODEL), "recommendations enabled");
    Ok(RecommendationGateway::new(Arc::new(model)))
}
