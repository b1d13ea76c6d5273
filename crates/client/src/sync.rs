//! HTTP fetches against the catalog API.

use std::time::Duration;

use thiserror::Error;

use pricewatch_catalog::PriceRecord;
use pricewatch_core::ProductId;

use crate::cache::SharedPriceCache;

/// Bound on one catalog request, including reading the body.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Client for full fetches of price state.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    api_url: String,
}

impl CatalogClient {
    pub fn new(api_url: impl Into<String>) -> Result<Self, SyncError> {
        Self::with_timeout(api_url, DEFAULT_HTTP_TIMEOUT)
    }

    pub fn with_timeout(api_url: impl Into<String>, timeout: Duration) -> Result<Self, SyncError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Network(e.to_string()))?;
        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Check connectivity by hitting the health endpoint.
    pub async fn check_connectivity(&self) -> bool {
        let url = format!("{}/health", self.api_url);
        matches!(self.http.get(&url).send().await, Ok(resp) if resp.status().is_success())
    }

    pub async fn prices_for_product(&self, product_id: ProductId) -> Result<Vec<PriceRecord>, SyncError> {
        let url = format!("{}/api/products/{}/prices", self.api_url, product_id);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(SyncError::Api(
                resp.status().as_u16(),
                resp.text().await.unwrap_or_default(),
            ));
        }

        resp.json().await.map_err(|e| SyncError::Parse(e.to_string()))
    }

    /// Fetch one product and replace its cached prices.
    pub async fn load_product(&self, cache: &SharedPriceCache, product_id: ProductId) -> Result<(), SyncError> {
        let records = self.prices_for_product(product_id).await?;
        let mut cache = cache.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        cache.load_product(product_id, &records);
        Ok(())
    }

    /// Start holding `products` and try to fetch each one. Returns how many loaded.
    ///
    /// A product whose fetch fails stays held with no prices, so the next
    /// [`refresh_all`](Self::refresh_all) picks it up.
    pub async fn load_watched(&self, cache: &SharedPriceCache, products: &[ProductId]) -> usize {
        {
            let mut cache = cache.write().unwrap_or_else(std::sync::PoisonError::into_inner);
            for product_id in products {
                cache.watch(*product_id);
            }
        }

        let mut loaded = 0;
        for product_id in products {
            match self.load_product(cache, *product_id).await {
                Ok(()) => loaded += 1,
                Err(e) => tracing::warn!(product_id = %product_id, error = %e, "initial price fetch failed"),
            }
        }
        loaded
    }

    /// Re-fetch every held product. Returns how many were refreshed; failures are
    /// logged and leave that product's previous prices in place.
    pub async fn refresh_all(&self, cache: &SharedPriceCache) -> usize {
        let held = cache
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .held_products();

        let mut refreshed = 0;
        for product_id in held {
            match self.load_product(cache, product_id).await {
                Ok(()) => refreshed += 1,
                Err(e) => tracing::warn!(product_id = %product_id, error = %e, "price refresh failed"),
            }
        }
        refreshed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn hung_server_fails_within_timeout() {
        // Accepts connections but never answers.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let client =
            CatalogClient::with_timeout(format!("http://{addr}/"), Duration::from_millis(200)).unwrap();
        let res = tokio::time::timeout(
            Duration::from_secs(5),
            client.prices_for_product(ProductId::new(1)),
        )
        .await
        .expect("request was not bounded by the client timeout");
        assert!(matches!(res, Err(SyncError::Network(_))));
        assert!(!client.check_connectivity().await);

        server.abort();
    }
}
