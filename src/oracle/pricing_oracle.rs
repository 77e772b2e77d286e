//! Fair-price oracle pipeline.
//!
//! Loads the fixtures for one NFT and runs them through eligibility, floor
//! aggregation, the floor-only policy, sales aggregation and blending. Every
//! failure along the way degrades to a zero price.

use crate::oracle::blender::blend_prices;
use crate::oracle::eligibility::EligibilityFilter;
use crate::oracle::fixtures::{load_collection_snapshot, load_sales_history, FixturePaths};
use crate::oracle::floor_policy::FloorOnlyPolicy;
use crate::oracle::floor_price::average_floor_price;
use crate::oracle::price_feed::PriceFeed;
use crate::oracle::sales::{usd_to_wei, SalesAggregator};
use crate::oracle::types::{
    CollectionSnapshot, Eligibility, OracleConfig, PriceBasis, PricingStrategy, SalesHistory,
};
use crate::types::{FairPrice, NftRef};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Full breakdown of one pricing run.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    pub strategy: PricingStrategy,
    pub eligibility: Eligibility,
    pub floor_price: f64,
    /// `None` when the strategy does not consult the floor-only policy
    pub basis: Option<PriceBasis>,
    /// Sales average in the floor price's unit
    pub sales_average: f64,
    pub fair_price: FairPrice,
}

impl PriceQuote {
    fn rejected(strategy: PricingStrategy, eligibility: Eligibility) -> Self {
        Self {
            strategy,
            eligibility,
            floor_price: 0.0,
            basis: None,
            sales_average: 0.0,
            fair_price: FairPrice::ZERO,
        }
    }
}

pub struct PricingOracle {
    config: OracleConfig,
    eligibility: EligibilityFilter,
    policy: FloorOnlyPolicy,
    sales: SalesAggregator,
    price_feed: Arc<dyn PriceFeed>,
}

impl PricingOracle {
    pub fn new(config: OracleConfig, price_feed: Arc<dyn PriceFeed>) -> Self {
        let eligibility = EligibilityFilter::new(config.eligibility.clone());
        let policy = FloorOnlyPolicy::new(config.policy.clone());
        let sales = SalesAggregator::new(config.reference_token.clone(), config.iqr_multiplier);

        Self {
            config,
            eligibility,
            policy,
            sales,
            price_feed,
        }
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    /// Price an NFT from its fixtures as of now.
    pub async fn price(&self, nft: &NftRef) -> FairPrice {
        self.quote(nft, Utc::now()).await.fair_price
    }

    /// Load the fixtures for `nft` and price them as of `now`.
    #[instrument(skip(self, nft), fields(nft = %nft, strategy = %self.config.strategy))]
    pub async fn quote(&self, nft: &NftRef, now: DateTime<Utc>) -> PriceQuote {
        let paths = FixturePaths::resolve(&self.config.data_dir, self.config.strategy, nft);
        debug!("Fixture paths: {:?}", paths);

        let snapshot = load_collection_snapshot(&paths.general);
        let history = load_sales_history(&paths.sales);

        let quote = self.quote_snapshot(&snapshot, &history, now).await;
        info!(
            "Priced {} at {} (floor {}, sales {})",
            nft, quote.fair_price, quote.floor_price, quote.sales_average
        );
        quote
    }

    /// Price already-loaded fixture data as of `now`.
    pub async fn quote_snapshot(
        &self,
        snapshot: &CollectionSnapshot,
        history: &SalesHistory,
        now: DateTime<Utc>,
    ) -> PriceQuote {
        let strategy = self.config.strategy;

        let eligibility = self.eligibility.check(snapshot);
        if let Eligibility::Rejected(reason) = &eligibility {
            warn!("Collection rejected: {}", reason);
            return PriceQuote::rejected(strategy, eligibility);
        }

        let floor_price = average_floor_price(snapshot, &self.config.reference_token);

        match strategy {
            PricingStrategy::Basic => {
                let sales_average = self.sales.native_average(history);
                PriceQuote {
                    strategy,
                    eligibility,
                    floor_price,
                    basis: None,
                    sales_average,
                    fair_price: FairPrice::from(blend_prices(floor_price, sales_average)),
                }
            }
            PricingStrategy::TimeWeighted => {
                let basis = self.policy.decide(snapshot, self.sales.count_sales(history));
                if let PriceBasis::FloorOnly(reason) = &basis {
                    debug!("Using floor price only: {}", reason);
                    return PriceQuote {
                        strategy,
                        eligibility,
                        floor_price,
                        basis: Some(basis),
                        sales_average: 0.0,
                        fair_price: FairPrice::from(floor_price),
                    };
                }

                let sales_average = self.time_weighted_sales_wei(history, now).await;
                PriceQuote {
                    strategy,
                    eligibility,
                    floor_price,
                    basis: Some(basis),
                    sales_average,
                    fair_price: FairPrice::from(blend_prices(floor_price, sales_average)),
                }
            }
        }
    }

    /// Recency-weighted USD sales average converted to WEI; zero on any failure.
    async fn time_weighted_sales_wei(&self, history: &SalesHistory, now: DateTime<Utc>) -> f64 {
        let average_usd = self.sales.time_weighted_usd_average(history, now);
        if average_usd <= 0.0 {
            return 0.0;
        }

        match self.price_feed.eth_usd().await {
            Ok(eth_usd) => usd_to_wei(average_usd, eth_usd),
            Err(e) => {
                warn!("Failed to fetch current ETH price, ignoring sales: {:#}", e);
                0.0
            }
        }
    }
}
