//! ETH/USD price feeds used to convert USD sale prices into WEI.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

/// Source of the current ETH price in USD.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Current price of one ETH in USD.
    async fn eth_usd(&self) -> Result<f64>;
}

/// CoinGecko `simple/price` endpoint. One attempt, no retry.
pub struct CoinGeckoFeed {
    http_client: Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl CoinGeckoFeed {
    pub fn new(
        http_client: Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
            api_key,
            timeout,
        }
    }

    fn price_url(&self) -> String {
        format!(
            "{}/api/v3/simple/price?ids=ethereum&vs_currencies=usd",
            self.base_url.trim_end_matches('/')
        )
    }
}

/// Pull `ethereum.usd` out of a `simple/price` response body.
pub fn parse_simple_price(body: &serde_json::Value) -> Result<f64> {
    body["ethereum"]["usd"]
        .as_f64()
        .context("Failed to parse ETH price from CoinGecko")
}

#[async_trait]
impl PriceFeed for CoinGeckoFeed {
    #[instrument(skip(self))]
    async fn eth_usd(&self) -> Result<f64> {
        let mut request = self
            .http_client
            .get(self.price_url())
            .header("accept", "application/json")
            .timeout(self.timeout);
        if let Some(key) = &self.api_key {
            request = request.header("x-cg-demo-api-key", key);
        }

        let response = request
            .send()
            .await
            .context("Failed to fetch current ETH price")?;

        if !response.status().is_success() {
            return Err(anyhow!("Failed to fetch current ETH price: {}", response.status()));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .context("Failed to decode CoinGecko response")?;

        let price = parse_simple_price(&body)?;
        debug!("Fetched ETH price: ${:.2}", price);
        Ok(price)
    }
}

/// Constant ETH/USD rate for offline runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedPriceFeed(pub f64);

#[async_trait]
impl PriceFeed for FixedPriceFeed {
    async fn eth_usd(&self) -> Result<f64> {
        if self.0 > 0.0 {
            Ok(self.0)
        } else {
            Err(anyhow!("Fixed ETH price must be positive, got {}", self.0))
        }
    }
}
