//! ledger value types shared by the gateway and the session core

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TransferError;

/// `shard.realm.num` account identifier, unvalidated until used
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// (shard, realm, num) when well formed
    pub fn parts(&self) -> Option<(u32, u64, u64)> {
        let mut it = self.0.split('.');
        let shard = it.next()?.parse().ok()?;
        let realm = it.next()?.parse().ok()?;
        let num = it.next()?.parse().ok()?;
        if it.next().is_some() {
            return None;
        }
        Some((shard, realm, num))
    }

    /// 20 byte long-zero evm address: shard(4) || realm(8) || num(8)
    pub fn long_zero_address(&self) -> Result<[u8; 20], TransferError> {
        let (shard, realm, num) = self
            .parts()
            .ok_or_else(|| TransferError::InvalidAccount(self.0.clone()))?;
        let mut out = [0u8; 20];
        out[..4].copy_from_slice(&shard.to_be_bytes());
        out[4..12].copy_from_slice(&realm.to_be_bytes());
        out[12..].copy_from_slice(&num.to_be_bytes());
        Ok(out)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// fungible token holding
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalance {
    pub token_id: String,
    pub amount: u64,
    /// mirror balances carry no decimals; 0 unless known
    #[serde(default)]
    pub decimals: u32,
}

/// balances of one account
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Balance {
    /// tinybars
    pub native: u64,
    pub tokens: Vec<TokenBalance>,
}

/// what a transfer moves
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Asset {
    Native,
    Token { id: String, decimals: u32 },
}

impl Asset {
    pub fn decimals(&self) -> u32 {
        match self {
            Asset::Native => crate::amount::NATIVE_DECIMALS,
            Asset::Token { decimals, .. } => *decimals,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferRequest {
    pub sender: AccountId,
    pub recipient: AccountId,
    pub asset: Asset,
    /// decimal string as typed by the user
    pub amount: String,
    pub memo: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub String);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// opaque pagination token
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(pub String);

/// one history row, amounts from the point of view of the queried account
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionRecord {
    pub id: String,
    pub consensus_timestamp: String,
    pub result: String,
    pub name: String,
    /// net tinybar change for the account
    pub net_amount: i64,
    pub memo: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HistoryPage {
    pub transactions: Vec<TransactionRecord>,
    pub next: Option<Cursor>,
}
