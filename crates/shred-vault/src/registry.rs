//! wallet discovery and sidecar metadata
//!
//! layout under the wallet directory:
//! ```text
//! wallet-<address>.dat    sealed phrase (see vault)
//! wallet-<address>.meta   plain json metadata
//! ```
//! nothing here reads or writes secret material.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Error, Result};

pub const WALLET_PREFIX: &str = "wallet";
pub const WALLET_EXT: &str = "dat";
pub const META_EXT: &str = "meta";

/// shown for wallets whose sidecar is missing or unreadable
pub const UNKNOWN_ADDRESS: &str = "Unknown (decrypt to view)";

pub const DEFAULT_NETWORK: &str = "testnet";

/// non-secret sidecar document
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletMetadata {
    #[serde(rename = "evm_address", alias = "address")]
    pub address: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    pub network: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub token_aliases: BTreeMap<String, String>,
}

impl WalletMetadata {
    pub fn new(address: impl Into<String>, network: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            created_at: Utc::now(),
            account_id: None,
            network: network.into(),
            token_aliases: BTreeMap::new(),
        }
    }
}

/// one discovered wallet
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalletSummary {
    pub path: PathBuf,
    pub file_name: String,
    pub address: String,
    pub account_id: Option<String>,
    pub network: String,
    pub created_at: DateTime<Utc>,
}

/// scans one directory of wallet files
#[derive(Clone, Debug)]
pub struct WalletRegistry {
    dir: PathBuf,
}

impl WalletRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<config dir>/shred`
    pub fn default_dir() -> Result<PathBuf> {
        let config = dirs::config_dir()
            .ok_or_else(|| Error::Storage("could not find config directory".into()))?;
        Ok(config.join("shred"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// create the directory, owner-only, if it does not exist
    pub fn ensure_dir(&self) -> Result<()> {
        ensure_private_dir(&self.dir)
    }

    /// `wallet-<address without 0x>.dat`
    pub fn wallet_path(&self, address: &str) -> PathBuf {
        let bare = address.strip_prefix("0x").unwrap_or(address);
        self.dir
            .join(format!("{}-{}.{}", WALLET_PREFIX, bare, WALLET_EXT))
    }

    /// list wallets sorted by file name; sidecar problems never fail the listing
    pub fn list(&self) -> Result<Vec<WalletSummary>> {
        ensure_private_dir(&self.dir)?;

        let entries =
            fs::read_dir(&self.dir).map_err(|e| Error::storage("read wallet directory", e))?;

        let mut wallets = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::storage("read wallet directory", e))?;
            let file_type = match entry.file_type() {
                Ok(t) => t,
                Err(_) => continue,
            };
            if !file_type.is_file() {
                continue;
            }

            let file_name = entry.file_name().to_string_lossy().into_owned();
            if !is_wallet_file(&file_name) {
                continue;
            }

            let path = entry.path();
            let metadata = self.load_metadata(&path).and_then(|meta| {
                if is_evm_address(&meta.address) {
                    Ok(meta)
                } else {
                    Err(Error::Storage("metadata address is not 0x + 40 hex digits".into()))
                }
            });
            let summary = match metadata {
                Ok(meta) => WalletSummary {
                    path,
                    file_name,
                    address: meta.address,
                    account_id: meta.account_id,
                    network: meta.network,
                    created_at: meta.created_at,
                },
                Err(e) => {
                    debug!(file = %file_name, "no usable metadata: {}", e);
                    let created_at = entry
                        .metadata()
                        .and_then(|m| m.modified())
                        .map(DateTime::<Utc>::from)
                        .unwrap_or_else(|_| Utc::now());
                    WalletSummary {
                        path,
                        file_name,
                        address: UNKNOWN_ADDRESS.to_string(),
                        account_id: None,
                        network: DEFAULT_NETWORK.to_string(),
                        created_at,
                    }
                }
            };
            wallets.push(summary);
        }

        wallets.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(wallets)
    }

    pub fn load_metadata(&self, wallet_path: &Path) -> Result<WalletMetadata> {
        let data = fs::read(metadata_path(wallet_path))
            .map_err(|e| Error::storage("read metadata", e))?;
        serde_json::from_slice(&data).map_err(|e| Error::storage("parse metadata", e))
    }

    pub fn save_metadata(&self, wallet_path: &Path, meta: &WalletMetadata) -> Result<()> {
        ensure_private_dir(&self.dir)?;
        let json =
            serde_json::to_vec_pretty(meta).map_err(|e| Error::storage("encode metadata", e))?;
        fs::write(metadata_path(wallet_path), json)
            .map_err(|e| Error::storage("write metadata", e))
    }

    /// load, apply `f`, save; failures are logged and swallowed
    pub fn update_metadata_best_effort<F>(&self, wallet_path: &Path, default: WalletMetadata, f: F)
    where
        F: FnOnce(&mut WalletMetadata),
    {
        let mut meta = self.load_metadata(wallet_path).unwrap_or(default);
        f(&mut meta);
        if let Err(e) = self.save_metadata(wallet_path, &meta) {
            warn!(path = %wallet_path.display(), "metadata not saved: {}", e);
        }
    }
}

/// same path with the extension swapped to `.meta`
pub fn metadata_path(wallet_path: &Path) -> PathBuf {
    wallet_path.with_extension(META_EXT)
}

fn is_evm_address(address: &str) -> bool {
    address
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 40 && hex.bytes().all(|b| b.is_ascii_hexdigit()))
}

fn is_wallet_file(name: &str) -> bool {
    name.starts_with(WALLET_PREFIX) && name.ends_with(&format!(".{}", WALLET_EXT))
}

/// create `dir` (and parents) readable by the owner only
pub(crate) fn ensure_private_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        fs::DirBuilder::new()
            .recursive(true)
            .mode(0o700)
            .create(dir)
            .map_err(|e| Error::storage("create wallet directory", e))
    }

    #[cfg(not(unix))]
    {
        fs::create_dir_all(dir).map_err(|e| Error::storage("create wallet directory", e))
    }
}
