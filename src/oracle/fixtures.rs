//! Fixture file layout and loading.
//!
//! Each strategy reads its fixtures from a fixed path pattern under the data
//! directory. Load failures are typed here and folded into empty data by the
//! caller.

use crate::oracle::types::{CollectionSnapshot, PricingStrategy, SalesHistory};
use crate::types::NftRef;
use serde::de::DeserializeOwned;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Failure to read a fixture file.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid JSON in file {path}: {source}")]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Paths of the two fixture files for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixturePaths {
    pub general: PathBuf,
    pub sales: PathBuf,
}

impl FixturePaths {
    /// Resolve fixture paths for the given strategy.
    pub fn resolve(data_dir: &Path, strategy: PricingStrategy, nft: &NftRef) -> Self {
        let NftRef { collection, token_id, iteration } = nft;
        match strategy {
            PricingStrategy::Basic => Self {
                general: data_dir.join(format!("{collection}_{token_id}_general_{iteration}.json")),
                sales: data_dir.join(format!("{collection}_{token_id}_sales_{iteration}.json")),
            },
            PricingStrategy::TimeWeighted => {
                let dir = data_dir.join(collection);
                Self {
                    general: dir.join(format!("{collection}_general_{iteration}.json")),
                    sales: dir.join(format!("{collection}_{token_id}_sales.json")),
                }
            }
        }
    }
}

/// Read and parse one JSON fixture.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, FixtureError> {
    let raw = fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => FixtureError::NotFound(path.to_path_buf()),
        _ => FixtureError::Io { path: path.to_path_buf(), source },
    })?;

    serde_json::from_str(&raw).map_err(|source| FixtureError::InvalidJson {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a fixture, falling back to empty data on any failure.
fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match load_json(path) {
        Ok(value) => {
            debug!("Loaded fixture {}", path.display());
            value
        }
        Err(e) => {
            warn!("{}", e);
            T::default()
        }
    }
}

#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_collection_snapshot(path: &Path) -> CollectionSnapshot {
    load_or_default(path)
}

#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_sales_history(path: &Path) -> SalesHistory {
    load_or_default(path)
}
