//! Command line entry point: prints the fair price of one NFT.
//!
//! Usage: `nft-price-oracle <collection_address> <token_id> <iteration>`

use anyhow::Result;
use clap::{Parser, ValueEnum};
use nft_price_oracle::oracle::{OracleBuilder, PricingStrategy};
use nft_price_oracle::NftRef;
use std::path::PathBuf;
use tracing::{info, Level};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Strategy {
    /// Prerequisite checks and a plain mean of ETH sales
    Basic,
    /// Full eligibility, floor-only policy and recency-weighted USD sales
    TimeWeighted,
}

impl From<Strategy> for PricingStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Basic => PricingStrategy::Basic,
            Strategy::TimeWeighted => PricingStrategy::TimeWeighted,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "nft-price-oracle", about = "Estimate the fair price of an NFT from marketplace data")]
struct Args {
    /// Collection name or contract address
    collection_address: String,

    /// Token id within the collection
    token_id: String,

    /// Snapshot iteration of the collection data
    iteration: String,

    #[arg(long, env = "NFT_ORACLE_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    #[arg(long, value_enum, env = "NFT_ORACLE_STRATEGY", default_value = "time-weighted")]
    strategy: Strategy,

    /// Fixed ETH/USD rate; skips the CoinGecko request
    #[arg(long, env = "NFT_ORACLE_ETH_USD")]
    eth_usd: Option<f64>,

    #[arg(long, env = "COINGECKO_API_URL", default_value = "https://api.coingecko.com")]
    coingecko_url: String,

    #[arg(long, env = "COINGECKO_API_KEY")]
    coingecko_api_key: Option<String>,

    #[arg(long, env = "NFT_ORACLE_LOG", default_value = "warn")]
    log_level: Level,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // stdout carries only the price
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(std::io::stderr)
        .init();

    let nft = NftRef::new(&args.collection_address, &args.token_id, &args.iteration);
    info!(data_dir = %args.data_dir.display(), strategy = ?args.strategy, "Pricing {}", nft);

    let oracle = OracleBuilder::new()
        .with_strategy(args.strategy.into())
        .with_data_dir(args.data_dir)
        .with_coingecko(args.coingecko_url, args.coingecko_api_key)
        .with_fixed_eth_usd(args.eth_usd)
        .build()?;

    let price = oracle.price(&nft).await;
    println!("{}", price);

    Ok(())
}
