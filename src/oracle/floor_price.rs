//! Floor-price aggregation across marketplaces.

use crate::oracle::types::CollectionSnapshot;
use tracing::{debug, instrument};

/// Mean of the floor prices listed in `reference_token`, or zero when none match.
#[instrument(skip(snapshot))]
pub fn average_floor_price(snapshot: &CollectionSnapshot, reference_token: &str) -> f64 {
    let prices: Vec<f64> = snapshot
        .collection
        .iter()
        .flat_map(|c| c.floor_prices.iter())
        .filter(|listing| listing.payment_token.is(reference_token))
        .filter_map(|listing| listing.value)
        .collect();

    if prices.is_empty() {
        debug!("No {} floor prices listed", reference_token);
        return 0.0;
    }

    let floor = prices.iter().sum::<f64>() / prices.len() as f64;
    debug!("Floor price over {} marketplaces: {}", prices.len(), floor);
    floor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::types::{CollectionInfo, FloorPrice, PaymentToken};

    fn listing(symbol: &str, value: Option<f64>) -> FloorPrice {
        FloorPrice {
            marketplace_id: Some("opensea".to_string()),
            value,
            payment_token: PaymentToken {
                symbol: Some(symbol.to_string()),
            },
        }
    }

    fn snapshot_with(floor_prices: Vec<FloorPrice>) -> CollectionSnapshot {
        CollectionSnapshot {
            collection: Some(CollectionInfo {
                floor_prices,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_mean_of_reference_token_listings() {
        let snapshot = snapshot_with(vec![
            listing("ETH", Some(10.0)),
            listing("ETH", Some(14.0)),
            listing("WETH", Some(100.0)),
        ]);

        assert_eq!(average_floor_price(&snapshot, "ETH"), 12.0);
    }

    #[test]
    fn test_no_matching_listings_is_zero() {
        let snapshot = snapshot_with(vec![listing("USDC", Some(3.0))]);

        assert_eq!(average_floor_price(&snapshot, "ETH"), 0.0);
    }

    #[test]
    fn test_missing_collection_is_zero() {
        assert_eq!(average_floor_price(&CollectionSnapshot::default(), "ETH"), 0.0);
    }

    #[test]
    fn test_listing_without_value_is_skipped() {
        let snapshot = snapshot_with(vec![listing("ETH", None), listing("ETH", Some(7.0))]);

        assert_eq!(average_floor_price(&snapshot, "ETH"), 7.0);
    }
}
