//! hedera network endpoints

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    #[default]
    Testnet,
    Previewnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Previewnet => "previewnet",
        }
    }

    pub fn mirror_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://mainnet-public.mirrornode.hedera.com",
            Network::Testnet => "https://testnet.mirrornode.hedera.com",
            Network::Previewnet => "https://previewnet.mirrornode.hedera.com",
        }
    }

    /// hashio json-rpc relay
    pub fn relay_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://mainnet.hashio.io/api",
            Network::Testnet => "https://testnet.hashio.io/api",
            Network::Previewnet => "https://previewnet.hashio.io/api",
        }
    }

    /// eip-155 chain id
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Mainnet => 295,
            Network::Testnet => 296,
            Network::Previewnet => 297,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "previewnet" => Ok(Network::Previewnet),
            other => Err(format!("unknown network: {}", other)),
        }
    }
}
