//! Final price blending.

use tracing::debug;

/// Mean of the positive members of `[floor, floor, sales]`, zero if none.
///
/// The floor price is counted twice so it outweighs a single sales average.
pub fn blend_prices(floor_price: f64, sales_average: f64) -> f64 {
    let prices: Vec<f64> = [floor_price, floor_price, sales_average]
        .into_iter()
        .filter(|p| *p > 0.0)
        .collect();

    if prices.is_empty() {
        debug!("No valid price data to blend");
        return 0.0;
    }

    prices.iter().sum::<f64>() / prices.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_weighted_double() {
        assert_eq!(blend_prices(9.0, 12.0), 10.0);
    }

    #[test]
    fn test_floor_only() {
        assert_eq!(blend_prices(9.0, 0.0), 9.0);
    }

    #[test]
    fn test_sales_only() {
        assert_eq!(blend_prices(0.0, 12.0), 12.0);
    }

    #[test]
    fn test_no_inputs_is_zero() {
        assert_eq!(blend_prices(0.0, 0.0), 0.0);
        assert_eq!(blend_prices(-1.0, -2.0), 0.0);
    }
}
