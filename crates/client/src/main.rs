use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;

use pricewatch_client::{
    CatalogClient, ClientConfig, ClientPriceCache, PriceSubscriber, Reconciler, TracingNotifier,
};
use pricewatch_observability::LogFormat;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_format = match std::env::var("LOG_FORMAT") {
        Ok(raw) => raw.parse::<LogFormat>().context("invalid LOG_FORMAT")?,
        Err(_) => LogFormat::Pretty,
    };
    pricewatch_observability::init(log_format);

    let config = ClientConfig::from_env().context("invalid client configuration")?;
    let catalog = CatalogClient::new(config.api_base()).context("failed to build HTTP client")?;

    if !catalog.check_connectivity().await {
        tracing::warn!(api = %config.api_url, "API not reachable yet; watched products load after connect");
    }

    let cache = ClientPriceCache::new().shared();
    catalog.load_watched(&cache, &config.watch_products).await;

    let reconciler = Arc::new(Reconciler::new(cache, Arc::new(TracingNotifier)));
    let subscriber = PriceSubscriber::new(config.ws_url.clone(), reconciler)
        .with_reconnect_delay(config.reconnect_delay)
        .with_catalog(catalog);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(subscriber.run(shutdown_rx));

    tokio::signal::ctrl_c().await.context("failed to listen for ctrl-c")?;
    let _ = shutdown_tx.send(true);
    task.await.context("subscriber task panicked")?;

    Ok(())
}
