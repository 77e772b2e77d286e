//! Core types and data structures for the pricing oracle.
//!
//! Fixture structs mirror the marketplace JSON layout. Every field is optional
//! and read on its own, so missing, null or off-type values turn into pricing
//! decisions instead of parse failures.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;

/// Token symbol a price is denominated in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentToken {
    #[serde(default, deserialize_with = "lenient")]
    pub symbol: Option<String>,
}

impl PaymentToken {
    pub fn is(&self, symbol: &str) -> bool {
        self.symbol.as_deref() == Some(symbol)
    }
}

/// One marketplace floor-price listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FloorPrice {
    #[serde(default, deserialize_with = "lenient")]
    pub marketplace_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub value: Option<f64>,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub payment_token: PaymentToken,
}

/// A marketplace page for the collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketplacePage {
    #[serde(default, deserialize_with = "lenient")]
    pub marketplace_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub verified: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractInfo {
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub contract_type: Option<String>,
}

/// Collection-wide statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionInfo {
    #[serde(default, deserialize_with = "lenient_seq")]
    pub floor_prices: Vec<FloorPrice>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub marketplace_pages: Vec<MarketplacePage>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub distinct_owner_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub distinct_nft_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_quantity: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub is_nsfw: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rarity {
    #[serde(default, deserialize_with = "lenient_count")]
    pub rank: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub unique_attributes: Option<u64>,
}

/// Contents of a "general" fixture file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionSnapshot {
    #[serde(default, deserialize_with = "lenient")]
    pub chain: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub contract: Option<ContractInfo>,
    #[serde(default, deserialize_with = "lenient")]
    pub collection: Option<CollectionInfo>,
    #[serde(default, deserialize_with = "lenient")]
    pub rarity: Option<Rarity>,
}

/// Sale-specific part of a transfer event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaleDetails {
    /// `None` counts as a single-item sale
    #[serde(default, deserialize_with = "lenient")]
    pub is_bundle_sale: Option<bool>,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub payment_token: PaymentToken,
    /// Price in the payment token's smallest unit (WEI for ETH)
    #[serde(default, deserialize_with = "lenient")]
    pub unit_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub unit_price_usd_cents: Option<f64>,
}

/// One entry of an NFT's transfer history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransferEvent {
    #[serde(default, deserialize_with = "lenient")]
    pub event_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub sale_details: Option<SaleDetails>,
}

impl TransferEvent {
    /// Sale details of a single-item sale, `None` for transfers and bundles.
    pub fn single_sale(&self) -> Option<&SaleDetails> {
        if self.event_type.as_deref() != Some("sale") {
            return None;
        }
        self.sale_details
            .as_ref()
            .filter(|d| !d.is_bundle_sale.unwrap_or(false))
    }
}

/// Contents of a "sales" fixture file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SalesHistory {
    #[serde(default, deserialize_with = "lenient_seq")]
    pub transfers: Vec<TransferEvent>,
}

// Fixture fields are read one at a time: a null or off-type value becomes
// "absent" for that field only, never a failure of the whole file.

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}

/// Non-negative integer, also accepting integral floats such as `120.0`.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| {
        v.as_u64().or_else(|| {
            v.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        })
    }))
}

/// Array whose unreadable entries are dropped individually.
fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items,
        _ => return Ok(Vec::new()),
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// Which generation of the pricing pipeline to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PricingStrategy {
    /// Prerequisite checks and a plain mean of native-unit sales.
    Basic,
    /// Full eligibility, floor-only policy and USD sales weighted by recency.
    #[default]
    TimeWeighted,
}

impl PricingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PricingStrategy::Basic => "basic",
            PricingStrategy::TimeWeighted => "time-weighted",
        }
    }
}

impl fmt::Display for PricingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rules applied by the eligibility filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibilityRules {
    pub required_chain: String,
    pub required_contract_type: String,
    /// Treat a missing NSFW flag as a missing required field
    pub require_nsfw_flag: bool,
    /// Marketplaces whose verified listing counts; empty disables the check
    pub trusted_marketplaces: Vec<String>,
    pub min_distinct_owners: u64,
}

/// Constants used by the floor-only decision policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyThresholds {
    /// Rank above `distinct_nft_count * rank_fraction` is floor-only
    pub rank_fraction: f64,
    pub min_rarity_score: f64,
    pub min_owner_ratio: f64,
    pub min_sales_count: usize,
}

/// Oracle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    pub strategy: PricingStrategy,
    /// Root directory of the fixture files
    pub data_dir: PathBuf,
    /// Token the floor and native sale prices are denominated in
    pub reference_token: String,
    pub eligibility: EligibilityRules,
    pub policy: PolicyThresholds,
    /// Interquartile range multiplier for outlier rejection
    pub iqr_multiplier: f64,
    /// Base URL of the CoinGecko API
    pub coingecko_url: String,
    pub coingecko_api_key: Option<String>,
    /// Price feed request timeout in seconds
    pub price_feed_timeout_seconds: u64,
}

impl Default for EligibilityRules {
    fn default() -> Self {
        Self {
            required_chain: "ethereum".to_string(),
            required_contract_type: "ERC721".to_string(),
            require_nsfw_flag: false,
            trusted_marketplaces: vec![
                "OpenSea".to_string(),
                "Blur".to_string(),
                "LooksRare".to_string(),
            ],
            min_distinct_owners: 10,
        }
    }
}

impl EligibilityRules {
    /// Prerequisite-only rules used by the basic strategy.
    pub fn prerequisites_only() -> Self {
        Self {
            require_nsfw_flag: true,
            trusted_marketplaces: Vec::new(),
            min_distinct_owners: 0,
            ..Self::default()
        }
    }
}

impl Default for PolicyThresholds {
    fn default() -> Self {
        Self {
            rank_fraction: 0.5,
            min_rarity_score: 1.0,
            min_owner_ratio: 0.2,
            min_sales_count: 3,
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            strategy: PricingStrategy::default(),
            data_dir: PathBuf::from("data"),
            reference_token: "ETH".to_string(),
            eligibility: EligibilityRules::default(),
            policy: PolicyThresholds::default(),
            iqr_multiplier: 1.5,
            coingecko_url: "https://api.coingecko.com".to_string(),
            coingecko_api_key: None,
            price_feed_timeout_seconds: 10,
        }
    }
}

/// Why a collection was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    MissingField(&'static str),
    WrongChain(String),
    WrongContractType(String),
    Nsfw,
    NoVerifiedMarketplace,
    TooFewOwners { found: u64, required: u64 },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MissingField(field) => write!(f, "missing key in data: {}", field),
            RejectReason::WrongChain(chain) => write!(f, "unsupported chain {}", chain),
            RejectReason::WrongContractType(kind) => write!(f, "unsupported contract type {}", kind),
            RejectReason::Nsfw => f.write_str("collection is flagged NSFW"),
            RejectReason::NoVerifiedMarketplace => f.write_str("no verified marketplace listing"),
            RejectReason::TooFewOwners { found, required } => {
                write!(f, "{} distinct owners, {} required", found, required)
            }
        }
    }
}

/// Outcome of the eligibility filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Eligibility {
    Eligible,
    Rejected(RejectReason),
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible)
    }
}

/// Why sales data was judged untrustworthy.
#[derive(Debug, Clone, PartialEq)]
pub enum FloorOnlyReason {
    HighRarityRank { rank: u64, threshold: f64 },
    LowRarityScore(f64),
    ConcentratedOwnership(f64),
    FewSales(usize),
}

impl fmt::Display for FloorOnlyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FloorOnlyReason::HighRarityRank { rank, threshold } => {
                write!(f, "rarity rank {} above {}", rank, threshold)
            }
            FloorOnlyReason::LowRarityScore(score) => write!(f, "rarity score {:.3}", score),
            FloorOnlyReason::ConcentratedOwnership(ratio) => {
                write!(f, "owner ratio {:.3}", ratio)
            }
            FloorOnlyReason::FewSales(count) => write!(f, "only {} sales", count),
        }
    }
}

/// Outcome of the floor-only decision policy.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceBasis {
    /// Sales history may be blended with the floor price
    Blended,
    /// Only the floor price should be used
    FloorOnly(FloorOnlyReason),
}

impl PriceBasis {
    pub fn is_floor_only(&self) -> bool {
        matches!(self, PriceBasis::FloorOnly(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = OracleConfig::default();

        assert_eq!(config.strategy, PricingStrategy::TimeWeighted);
        assert_eq!(config.reference_token, "ETH");
        assert_eq!(config.iqr_multiplier, 1.5);
        assert_eq!(config.eligibility.min_distinct_owners, 10);
        assert_eq!(config.policy.min_sales_count, 3);
        assert_eq!(config.policy.min_owner_ratio, 0.2);
    }

    #[test]
    fn test_prerequisites_only_rules() {
        let rules = EligibilityRules::prerequisites_only();

        assert!(rules.trusted_marketplaces.is_empty());
        assert_eq!(rules.min_distinct_owners, 0);
        assert!(rules.require_nsfw_flag);
        assert_eq!(rules.required_chain, "ethereum");
    }

    #[test]
    fn test_snapshot_tolerates_missing_fields() {
        let snapshot: CollectionSnapshot = serde_json::from_str(r#"{"chain": "ethereum"}"#).unwrap();

        assert_eq!(snapshot.chain.as_deref(), Some("ethereum"));
        assert!(snapshot.contract.is_none());
        assert!(snapshot.collection.is_none());
    }

    #[test]
    fn test_transfer_single_sale() {
        let json = r#"{
            "transfers": [
                {"event_type": "sale", "sale_details": {"is_bundle_sale": false, "unit_price": 5}},
                {"event_type": "sale", "sale_details": {"is_bundle_sale": true, "unit_price": 9}},
                {"event_type": "transfer"}
            ]
        }"#;
        let history: SalesHistory = serde_json::from_str(json).unwrap();

        let sales: Vec<_> = history.transfers.iter().filter_map(|t| t.single_sale()).collect();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].unit_price, Some(5.0));
    }

    #[test]
    fn test_null_bundle_flag_counts_as_single_sale() {
        let json = r#"{
            "transfers": [
                {"event_type": "sale", "sale_details": {"is_bundle_sale": null, "unit_price": 5}},
                {"event_type": "sale", "sale_details": {"is_bundle_sale": true, "unit_price": 9}}
            ]
        }"#;
        let history: SalesHistory = serde_json::from_str(json).unwrap();

        assert_eq!(history.transfers.len(), 2);
        let sales: Vec<_> = history.transfers.iter().filter_map(|t| t.single_sale()).collect();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].unit_price, Some(5.0));
    }

    #[test]
    fn test_float_rank_and_counts_accepted() {
        let json = r#"{
            "chain": "ethereum",
            "collection": {"distinct_owner_count": 600.0, "total_quantity": 1000, "distinct_nft_count": null},
            "rarity": {"rank": 120.0, "score": 2.4}
        }"#;
        let snapshot: CollectionSnapshot = serde_json::from_str(json).unwrap();

        let collection = snapshot.collection.unwrap();
        assert_eq!(collection.distinct_owner_count, Some(600));
        assert_eq!(collection.total_quantity, Some(1000));
        assert_eq!(collection.distinct_nft_count, None);
        assert_eq!(snapshot.rarity.unwrap().rank, Some(120));
    }

    #[test]
    fn test_off_type_fields_only_drop_themselves() {
        let json = r#"{
            "chain": "ethereum",
            "contract": {"type": "ERC721"},
            "collection": {
                "is_nsfw": "no",
                "marketplace_pages": [{"marketplace_name": "OpenSea", "verified": "yes"}, 42],
                "floor_prices": [{"value": "cheap", "payment_token": {"symbol": "ETH"}}, {"value": 3, "payment_token": null}]
            },
            "rarity": {"rank": -4, "score": "rare"}
        }"#;
        let snapshot: CollectionSnapshot = serde_json::from_str(json).unwrap();

        assert_eq!(snapshot.chain.as_deref(), Some("ethereum"));
        let collection = snapshot.collection.unwrap();
        assert_eq!(collection.is_nsfw, None);
        assert_eq!(collection.marketplace_pages.len(), 1);
        assert_eq!(collection.marketplace_pages[0].verified, None);
        assert_eq!(collection.floor_prices.len(), 2);
        assert_eq!(collection.floor_prices[0].value, None);
        assert_eq!(collection.floor_prices[1].payment_token.symbol, None);
        let rarity = snapshot.rarity.unwrap();
        assert_eq!(rarity.rank, None);
        assert_eq!(rarity.score, None);
    }

    #[test]
    fn test_strategy_serde_names() {
        let strategy: PricingStrategy = serde_json::from_str("\"time-weighted\"").unwrap();
        assert_eq!(strategy, PricingStrategy::TimeWeighted);
        assert_eq!(PricingStrategy::Basic.to_string(), "basic");
    }
}
