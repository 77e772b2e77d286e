//! Floor-only decision policy.
//!
//! Decides whether an NFT's own sales are trustworthy enough to blend with
//! the collection floor, or whether the floor alone should be used.

use crate::oracle::types::{CollectionSnapshot, FloorOnlyReason, PolicyThresholds, PriceBasis};
use tracing::{debug, instrument};

pub struct FloorOnlyPolicy {
    thresholds: PolicyThresholds,
}

impl FloorOnlyPolicy {
    pub fn new(thresholds: PolicyThresholds) -> Self {
        Self { thresholds }
    }

    /// Decide the price basis. `sales_count` is the number of qualifying sales.
    #[instrument(skip(self, snapshot))]
    pub fn decide(&self, snapshot: &CollectionSnapshot, sales_count: usize) -> PriceBasis {
        let basis = match self.floor_only_reason(snapshot, sales_count) {
            Some(reason) => PriceBasis::FloorOnly(reason),
            None => PriceBasis::Blended,
        };
        debug!("Price basis: {:?}", basis);
        basis
    }

    fn floor_only_reason(
        &self,
        snapshot: &CollectionSnapshot,
        sales_count: usize,
    ) -> Option<FloorOnlyReason> {
        let t = &self.thresholds;
        let rarity = snapshot.rarity.clone().unwrap_or_default();
        let collection = snapshot.collection.clone().unwrap_or_default();

        // Zero rank or score means "unranked"
        let rank_threshold = collection.distinct_nft_count.unwrap_or(0) as f64 * t.rank_fraction;
        if let Some(rank) = rarity.rank.filter(|&r| r > 0) {
            if rank as f64 > rank_threshold {
                return Some(FloorOnlyReason::HighRarityRank {
                    rank,
                    threshold: rank_threshold,
                });
            }
        }

        if let Some(score) = rarity.score.filter(|&s| s != 0.0) {
            if score < t.min_rarity_score {
                return Some(FloorOnlyReason::LowRarityScore(score));
            }
        }

        let total = collection.total_quantity.unwrap_or(0);
        if total > 0 {
            let ratio = collection.distinct_owner_count.unwrap_or(0) as f64 / total as f64;
            if ratio < t.min_owner_ratio {
                return Some(FloorOnlyReason::ConcentratedOwnership(ratio));
            }
        }

        if sales_count < t.min_sales_count {
            return Some(FloorOnlyReason::FewSales(sales_count));
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::types::{CollectionInfo, Rarity};

    fn snapshot(rank: Option<u64>, score: Option<f64>, owners: u64, total: u64) -> CollectionSnapshot {
        CollectionSnapshot {
            collection: Some(CollectionInfo {
                distinct_owner_count: Some(owners),
                distinct_nft_count: Some(total),
                total_quantity: Some(total),
                ..Default::default()
            }),
            rarity: Some(Rarity {
                rank,
                score,
                unique_attributes: None,
            }),
            ..Default::default()
        }
    }

    fn policy() -> FloorOnlyPolicy {
        FloorOnlyPolicy::new(PolicyThresholds::default())
    }

    #[test]
    fn test_trustworthy_sales_are_blended() {
        let snapshot = snapshot(Some(120), Some(3.4), 6_000, 10_000);

        assert_eq!(policy().decide(&snapshot, 5), PriceBasis::Blended);
    }

    #[test]
    fn test_rank_above_half_collection_is_floor_only() {
        let snapshot = snapshot(Some(6_001), Some(3.4), 6_000, 10_000);

        assert_eq!(
            policy().decide(&snapshot, 5),
            PriceBasis::FloorOnly(FloorOnlyReason::HighRarityRank {
                rank: 6_001,
                threshold: 5_000.0,
            })
        );
    }

    #[test]
    fn test_float_rank_from_json_is_compared() {
        let json = r#"{
            "collection": {"distinct_owner_count": 6000.0, "distinct_nft_count": 10000.0, "total_quantity": 10000},
            "rarity": {"rank": 6001.0, "score": 3.4}
        }"#;
        let snapshot: CollectionSnapshot = serde_json::from_str(json).unwrap();

        assert_eq!(
            policy().decide(&snapshot, 5),
            PriceBasis::FloorOnly(FloorOnlyReason::HighRarityRank {
                rank: 6_001,
                threshold: 5_000.0,
            })
        );
    }

    #[test]
    fn test_rank_at_half_is_blended() {
        let snapshot = snapshot(Some(5_000), Some(3.4), 6_000, 10_000);

        assert!(!policy().decide(&snapshot, 5).is_floor_only());
    }

    #[test]
    fn test_low_rarity_score_is_floor_only() {
        let snapshot = snapshot(Some(10), Some(0.4), 6_000, 10_000);

        assert_eq!(
            policy().decide(&snapshot, 5),
            PriceBasis::FloorOnly(FloorOnlyReason::LowRarityScore(0.4))
        );
    }

    #[test]
    fn test_zero_rank_and_score_are_ignored() {
        let snapshot = snapshot(Some(0), Some(0.0), 6_000, 10_000);

        assert_eq!(policy().decide(&snapshot, 5), PriceBasis::Blended);
    }

    #[test]
    fn test_concentrated_ownership_is_floor_only() {
        let snapshot = snapshot(None, None, 1_000, 10_000);

        assert_eq!(
            policy().decide(&snapshot, 5),
            PriceBasis::FloorOnly(FloorOnlyReason::ConcentratedOwnership(0.1))
        );
    }

    #[test]
    fn test_few_sales_is_floor_only() {
        let snapshot = snapshot(None, None, 6_000, 10_000);

        assert_eq!(
            policy().decide(&snapshot, 2),
            PriceBasis::FloorOnly(FloorOnlyReason::FewSales(2))
        );
        assert_eq!(policy().decide(&snapshot, 3), PriceBasis::Blended);
    }

    #[test]
    fn test_empty_snapshot_falls_through_to_sales_count() {
        let empty = CollectionSnapshot::default();

        assert!(policy().decide(&empty, 0).is_floor_only());
        assert!(!policy().decide(&empty, 10).is_floor_only());
    }
}
