//! Tests for the command line binary

use std::path::PathBuf;
use std::process::{Command, Output};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_nft-price-oracle"))
        .args(args)
        .arg("--data-dir")
        .arg(fixtures_dir())
        .arg("--eth-usd")
        .arg("2000")
        .env_remove("NFT_ORACLE_STRATEGY")
        .env_remove("NFT_ORACLE_LOG")
        .output()
        .expect("Failed to run nft-price-oracle")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

#[test]
fn test_wrong_argument_count_prints_usage() {
    let output = run(&["gNft", "1"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_prints_floor_price_as_integer_wei() {
    let output = run(&["gNft", "1", "1"]);

    assert!(output.status.success());
    assert_eq!(stdout(&output), "2000000000000000000");
}

#[test]
fn test_basic_strategy_round_trip() {
    let output = run(&["roundtrip", "1", "1", "--strategy", "basic"]);

    assert!(output.status.success());
    assert_eq!(stdout(&output), "10");
}

#[test]
fn test_missing_data_prints_zero() {
    let output = run(&["ghost", "0", "9"]);

    assert!(output.status.success());
    assert_eq!(stdout(&output), "0");
}
