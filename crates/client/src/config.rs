use std::time::Duration;

use thiserror::Error;
use url::Url;

use pricewatch_core::{DomainError, ProductId};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(5_000);

#[derive(Debug, Error)]
pub enum ClientConfigError {
    #[error("invalid URL in {key}: {source}")]
    Url {
        key: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("{key} must use {expected}, got `{got}`")]
    Scheme {
        key: &'static str,
        expected: &'static str,
        got: String,
    },

    #[error("invalid PRICEWATCH_RECONNECT_DELAY_MS: `{0}`")]
    Delay(String),

    #[error("invalid PRICEWATCH_WATCH_PRODUCTS entry: {0}")]
    Product(#[from] DomainError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: Url,
    pub ws_url: Url,
    /// Constant wait between reconnect attempts.
    pub reconnect_delay: Duration,
    pub watch_products: Vec<ProductId>,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ClientConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_raw = get("PRICEWATCH_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = parse_url("PRICEWATCH_API_URL", &api_raw, &["http", "https"])?;

        let ws_url = match get("PRICEWATCH_WS_URL") {
            Some(raw) => parse_url("PRICEWATCH_WS_URL", &raw, &["ws", "wss"])?,
            None => ws_url_for(&api_url)?,
        };

        let reconnect_delay = match get("PRICEWATCH_RECONNECT_DELAY_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ClientConfigError::Delay(raw))?,
            None => DEFAULT_RECONNECT_DELAY,
        };

        let watch_products = get("PRICEWATCH_WATCH_PRODUCTS")
            .map(|raw| {
                raw.split(',')
                    .filter(|s| !s.trim().is_empty())
                    .map(str::parse::<ProductId>)
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            api_url,
            ws_url,
            reconnect_delay,
            watch_products,
        })
    }

    /// API base URL without a trailing slash, as [`crate::CatalogClient`] expects.
    pub fn api_base(&self) -> String {
        self.api_url.as_str().trim_end_matches('/').to_string()
    }
}

fn parse_url(key: &'static str, raw: &str, schemes: &[&'static str]) -> Result<Url, ClientConfigError> {
    let url = Url::parse(raw.trim()).map_err(|source| ClientConfigError::Url { key, source })?;
    if !schemes.contains(&url.scheme()) {
        return Err(ClientConfigError::Scheme {
            key,
            expected: if schemes.contains(&"ws") { "ws or wss" } else { "http or https" },
            got: url.scheme().to_string(),
        });
    }
    Ok(url)
}

/// `http://host:port/...` -> `ws://host:port/ws` (`https` -> `wss`).
pub fn ws_url_for(api_url: &Url) -> Result<Url, ClientConfigError> {
    let scheme = if api_url.scheme() == "https" { "wss" } else { "ws" };
    let mut ws = api_url.clone();
    ws.set_scheme(scheme).map_err(|_| ClientConfigError::Scheme {
        key: "PRICEWATCH_API_URL",
        expected: "http or https",
        got: api_url.scheme().to_string(),
    })?;
    ws.set_path("/ws");
    ws.set_query(None);
    Ok(ws)
}
