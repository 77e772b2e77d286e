//! Sales-history aggregation.
//!
//! Sales are reduced to single-item sale events, outliers outside the
//! interquartile fence are dropped, and the survivors are averaged either
//! plainly (native units) or weighted by recency (USD).

use crate::oracle::types::SalesHistory;
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, instrument, warn};

const WEI_PER_ETH: f64 = 1e18;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// A USD-denominated sale with its settlement time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UsdSale {
    pub price_usd: f64,
    pub sold_at: DateTime<Utc>,
}

/// Inclusive `[Q1 - k*IQR, Q3 + k*IQR]` fence, or `None` for an empty slice.
///
/// Quartiles are taken at indices `n/4` and `3n/4` of the sorted values.
pub fn iqr_bounds(values: &[f64], multiplier: f64) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    let q1 = sorted[n / 4];
    let q3 = sorted[3 * n / 4];
    let iqr = q3 - q1;

    Some((q1 - multiplier * iqr, q3 + multiplier * iqr))
}

/// Parse a sale timestamp (`2024-01-31T12:00:00Z`, RFC 3339 accepted too).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%SZ")
        .map(|naive| naive.and_utc())
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.with_timezone(&Utc)))
}

/// Recency weight `1 / (1 + age_in_days)`. Future sales count as age zero.
pub fn recency_weight(sold_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let age_days = ((now - sold_at).num_milliseconds() as f64 / MILLIS_PER_DAY).max(0.0);
    1.0 / (1.0 + age_days)
}

/// Convert a USD amount to WEI at the given ETH/USD rate, truncated.
pub fn usd_to_wei(usd: f64, eth_usd: f64) -> f64 {
    if !(eth_usd > 0.0) || !usd.is_finite() {
        return 0.0;
    }
    (usd / eth_usd * WEI_PER_ETH).trunc()
}

/// Aggregator over an NFT's sales history.
pub struct SalesAggregator {
    reference_token: String,
    iqr_multiplier: f64,
}

impl SalesAggregator {
    pub fn new(reference_token: impl Into<String>, iqr_multiplier: f64) -> Self {
        Self {
            reference_token: reference_token.into(),
            iqr_multiplier,
        }
    }

    /// Number of single-item sales paid in the reference token.
    pub fn count_sales(&self, history: &SalesHistory) -> usize {
        history
            .transfers
            .iter()
            .filter_map(|t| t.single_sale())
            .filter(|sale| sale.payment_token.is(&self.reference_token))
            .count()
    }

    /// Mean native-unit sale price after outlier rejection; zero if nothing qualifies.
    #[instrument(skip_all)]
    pub fn native_average(&self, history: &SalesHistory) -> f64 {
        let prices: Vec<f64> = history
            .transfers
            .iter()
            .filter_map(|t| t.single_sale())
            .filter(|sale| sale.payment_token.is(&self.reference_token))
            .filter_map(|sale| sale.unit_price)
            .collect();

        let Some((lower, upper)) = iqr_bounds(&prices, self.iqr_multiplier) else {
            debug!("No {} sales found", self.reference_token);
            return 0.0;
        };

        let kept: Vec<f64> = prices
            .into_iter()
            .filter(|p| (lower..=upper).contains(p))
            .collect();
        if kept.is_empty() {
            return 0.0;
        }

        let average = kept.iter().sum::<f64>() / kept.len() as f64;
        debug!("Native sales average over {} sales: {}", kept.len(), average);
        average
    }

    /// Single-item sales with a USD price and a readable timestamp.
    pub fn usd_sales(&self, history: &SalesHistory) -> Vec<UsdSale> {
        history
            .transfers
            .iter()
            .filter_map(|t| {
                let cents = t.single_sale()?.unit_price_usd_cents?;
                let raw = t.timestamp.as_deref()?;
                match parse_timestamp(raw) {
                    Some(sold_at) => Some(UsdSale {
                        price_usd: cents / 100.0,
                        sold_at,
                    }),
                    None => {
                        warn!("Skipping sale with invalid timestamp {:?}", raw);
                        None
                    }
                }
            })
            .collect()
    }

    /// Recency-weighted mean USD sale price after outlier rejection.
    #[instrument(skip(self, history))]
    pub fn time_weighted_usd_average(&self, history: &SalesHistory, now: DateTime<Utc>) -> f64 {
        let sales = self.usd_sales(history);
        let prices: Vec<f64> = sales.iter().map(|s| s.price_usd).collect();

        let Some((lower, upper)) = iqr_bounds(&prices, self.iqr_multiplier) else {
            debug!("No USD sales found");
            return 0.0;
        };

        let (weighted_sum, weight_total) = sales
            .iter()
            .filter(|s| (lower..=upper).contains(&s.price_usd))
            .map(|s| (s.price_usd, recency_weight(s.sold_at, now)))
            .fold((0.0, 0.0), |(sum, total), (price, weight)| {
                (sum + price * weight, total + weight)
            });

        if weight_total <= 0.0 {
            return 0.0;
        }

        let average = weighted_sum / weight_total;
        debug!("Time-weighted USD average: {:.2}", average);
        average
    }
}
