//! Core types shared by the oracle and the command line.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a single pricing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftRef {
    /// Collection name or contract address, as used in fixture file names
    pub collection: String,
    /// Token id within the collection
    pub token_id: String,
    /// Snapshot iteration of the collection fixture
    pub iteration: String,
}

impl NftRef {
    pub fn new(
        collection: impl Into<String>,
        token_id: impl Into<String>,
        iteration: impl Into<String>,
    ) -> Self {
        Self {
            collection: collection.into(),
            token_id: token_id.into(),
            iteration: iteration.into(),
        }
    }
}

impl fmt::Display for NftRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{} (iteration {})", self.collection, self.token_id, self.iteration)
    }
}

/// Fair price estimate. Zero means "no usable price".
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct FairPrice(pub f64);

impl FairPrice {
    pub const ZERO: FairPrice = FairPrice(0.0);

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 <= 0.0
    }
}

impl From<f64> for FairPrice {
    fn from(value: f64) -> Self {
        // Negative or NaN inputs collapse to zero
        if value.is_finite() && value > 0.0 {
            FairPrice(value)
        } else {
            FairPrice::ZERO
        }
    }
}

impl fmt::Display for FairPrice {
    // f64's Display never uses exponent notation and drops a trailing ".0",
    // so WEI amounts print as plain integers.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
