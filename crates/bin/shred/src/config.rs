//! Runtime configuration: `config.toml` plus `SHRED_*` environment overrides

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use shred_ledger::Network;
use shred_vault::WalletRegistry;

use crate::core::Settings;

pub const CONFIG_FILE: &str = "config.toml";
pub const LOG_FILE: &str = "shred.log";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub network: Network,
    /// overrides the network's public mirror node
    pub mirror_url: Option<String>,
    /// overrides the network's public json-rpc relay
    pub relay_url: Option<String>,
    pub wallet_dir: Option<PathBuf>,
    pub idle_timeout_secs: u64,
    pub tick_ms: u64,
    pub transfer_memo: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: Network::Testnet,
            mirror_url: None,
            relay_url: None,
            wallet_dir: None,
            idle_timeout_secs: 600,
            tick_ms: 100,
            transfer_memo: "Sent via shred".into(),
        }
    }
}

impl Config {
    /// `<config dir>/shred/config.toml` if present, then the environment
    pub fn load() -> Result<Self> {
        let path = WalletRegistry::default_dir()?.join(CONFIG_FILE);
        let mut config = Self::from_file(&path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Defaults when the file does not exist
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(network) = var("SHRED_NETWORK") {
            self.network = network
                .parse()
                .map_err(|e: String| anyhow!("SHRED_NETWORK: {}", e))?;
        }
        if let Some(url) = var("SHRED_MIRROR_URL") {
            self.mirror_url = Some(url);
        }
        if let Some(url) = var("SHRED_RELAY_URL") {
            self.relay_url = Some(url);
        }
        if let Some(dir) = var("SHRED_WALLET_DIR") {
            self.wallet_dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    pub fn mirror_url(&self) -> &str {
        self.mirror_url
            .as_deref()
            .unwrap_or_else(|| self.network.mirror_url())
    }

    pub fn relay_url(&self) -> &str {
        self.relay_url
            .as_deref()
            .unwrap_or_else(|| self.network.relay_url())
    }

    pub fn wallet_dir(&self) -> Result<PathBuf> {
        match &self.wallet_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(WalletRegistry::default_dir()?),
        }
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        Ok(self.wallet_dir()?.join(LOG_FILE))
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    pub fn settings(&self) -> Settings {
        Settings {
            network: self.network.to_string(),
            memo: self.transfer_memo.clone(),
        }
    }
}
