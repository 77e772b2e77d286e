//! Oracle module - NFT fair-price estimation.
//!
//! The pipeline is split into small stages (eligibility, floor price,
//! floor-only policy, sales aggregation, blending) that `PricingOracle`
//! runs in order over one pair of fixture files.

pub mod types;
pub mod fixtures;
pub mod eligibility;
pub mod floor_price;
pub mod floor_policy;
pub mod sales;
pub mod price_feed;
pub mod blender;
pub mod pricing_oracle;

// Re-export main public types and the primary oracle
pub use pricing_oracle::{PriceQuote, PricingOracle};
pub use types::{
    CollectionSnapshot, Eligibility, EligibilityRules, FloorOnlyReason, OracleConfig,
    PolicyThresholds, PriceBasis, PricingStrategy, RejectReason, SalesHistory,
};

// Re-export stage components for advanced usage
pub use blender::blend_prices;
pub use eligibility::EligibilityFilter;
pub use fixtures::{FixtureError, FixturePaths};
pub use floor_policy::FloorOnlyPolicy;
pub use floor_price::average_floor_price;
pub use price_feed::{CoinGeckoFeed, FixedPriceFeed, PriceFeed};
pub use sales::SalesAggregator;

use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Oracle builder for convenient construction with sensible defaults.
pub struct OracleBuilder {
    config: OracleConfig,
    eth_usd: Option<f64>,
}

impl OracleBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: OracleConfig::default(),
            eth_usd: None,
        }
    }

    /// Select the pricing strategy. Also selects the matching eligibility rules.
    pub fn with_strategy(mut self, strategy: PricingStrategy) -> Self {
        self.config.strategy = strategy;
        self.config.eligibility = match strategy {
            PricingStrategy::Basic => EligibilityRules::prerequisites_only(),
            PricingStrategy::TimeWeighted => EligibilityRules::default(),
        };
        self
    }

    /// Set the fixture root directory.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = data_dir.into();
        self
    }

    /// Set eligibility rules.
    pub fn with_eligibility(mut self, rules: EligibilityRules) -> Self {
        self.config.eligibility = rules;
        self
    }

    /// Set floor-only policy thresholds.
    pub fn with_policy(mut self, thresholds: PolicyThresholds) -> Self {
        self.config.policy = thresholds;
        self
    }

    /// Set the outlier fence multiplier.
    pub fn with_iqr_multiplier(mut self, multiplier: f64) -> Self {
        self.config.iqr_multiplier = multiplier;
        self
    }

    /// Set the CoinGecko endpoint and optional demo API key.
    pub fn with_coingecko(mut self, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        self.config.coingecko_url = base_url.into();
        self.config.coingecko_api_key = api_key;
        self
    }

    /// Set the price feed request timeout.
    pub fn with_price_feed_timeout(mut self, timeout_seconds: u64) -> Self {
        self.config.price_feed_timeout_seconds = timeout_seconds;
        self
    }

    /// Use a fixed ETH/USD rate instead of querying CoinGecko.
    pub fn with_fixed_eth_usd(mut self, eth_usd: Option<f64>) -> Self {
        self.eth_usd = eth_usd;
        self
    }

    /// Build the oracle configuration.
    pub fn build_config(self) -> OracleConfig {
        self.config
    }

    /// Build the oracle with an explicit price feed.
    pub fn build_with_feed(self, price_feed: Arc<dyn PriceFeed>) -> PricingOracle {
        PricingOracle::new(self.config, price_feed)
    }

    /// Build the oracle with the fixed rate if set, CoinGecko otherwise.
    pub fn build(self) -> anyhow::Result<PricingOracle> {
        let price_feed: Arc<dyn PriceFeed> = match self.eth_usd {
            Some(rate) => Arc::new(FixedPriceFeed(rate)),
            None => {
                let timeout = Duration::from_secs(self.config.price_feed_timeout_seconds);
                let http_client = Client::builder().timeout(timeout).build()?;
                Arc::new(CoinGeckoFeed::new(
                    http_client,
                    self.config.coingecko_url.clone(),
                    self.config.coingecko_api_key.clone(),
                    timeout,
                ))
            }
        };
        Ok(self.build_with_feed(price_feed))
    }
}

impl Default for OracleBuilder {
    fn default() -> Self {
        Self::new()
    }
}
