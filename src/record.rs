//! Persisted match records
//!
//! One JSON document per found address, written once and never updated.
//! Key material is hex, the address is the bare 56-character body.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::keys::KeyPair;
use crate::onion;

/// The on-disk result of one accepted match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    /// 56-character address body, no `.onion` suffix
    pub onion_address: String,
    /// 64 hex chars
    pub public_key: String,
    /// 64 hex chars
    pub seed: String,
    /// 128 hex chars
    pub expanded_secret_key: String,
}

impl MatchRecord {
    /// Build the record for a matched key pair.
    pub fn from_keypair(pair: &KeyPair) -> Self {
        Self {
            onion_address: onion::pubkey_to_onion(&pair.public),
            public_key: hex::encode(pair.public),
            seed: hex::encode(pair.seed),
            expanded_secret_key: hex::encode(pair.expanded()),
        }
    }

    /// Write the record as `<address>.json` under `dir`, returning the path.
    pub fn save(&self, dir: &Path) -> io::Result<PathBuf> {
        let path = dir.join(format!("{}.json", self.onion_address));
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)?;
        Ok(path)
    }

    /// Load a previously saved record.
    pub fn load(path: &Path) -> io::Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
