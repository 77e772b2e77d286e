//! nft-price-oracle - fair-price estimation for NFTs
//!
//! This crate estimates a fair price for an NFT from marketplace fixture data:
//! collection floor prices, the token's sales history and, for USD-priced
//! sales, the current ETH/USD rate.

pub mod types;
pub mod oracle;

// Re-export main types for convenience
pub use types::{FairPrice, NftRef};
