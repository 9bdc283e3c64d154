//! hedera mirror node rest client (read side)

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Deserialize;
use tracing::debug;

use crate::error::NetworkError;
use crate::types::{AccountId, Balance, Cursor, HistoryPage, TokenBalance, TransactionRecord};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// `/api/v1/accounts/{id-or-address}` response, fields we use
#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct MirrorAccount {
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub balance: MirrorBalance,
    #[serde(default)]
    pub transactions: Vec<MirrorTransaction>,
    #[serde(default)]
    pub links: MirrorLinks,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct MirrorBalance {
    #[serde(default)]
    pub balance: i64,
    #[serde(default)]
    pub tokens: Vec<MirrorTokenBalance>,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct MirrorTokenBalance {
    pub token_id: String,
    #[serde(default)]
    pub balance: i64,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct MirrorTransaction {
    pub transaction_id: String,
    #[serde(default)]
    pub consensus_timestamp: String,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub transfers: Vec<MirrorTransfer>,
    #[serde(default)]
    pub memo_base64: String,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct MirrorTransfer {
    pub account: String,
    pub amount: i64,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct MirrorLinks {
    #[serde(default)]
    pub next: Option<String>,
}

/// read-only mirror node access
#[derive(Clone, Debug)]
pub struct MirrorClient {
    base: String,
    http: reqwest::Client,
}

impl MirrorClient {
    pub fn new(base: impl Into<String>) -> Result<Self, NetworkError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| NetworkError::Unreachable(e.to_string()))?;
        Ok(Self {
            base: base.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn account_url(&self, id_or_address: &str) -> String {
        let bare = id_or_address.strip_prefix("0x").unwrap_or(id_or_address);
        format!("{}/api/v1/accounts/{}", self.base, bare)
    }

    /// GET an account document; 404 is `None`
    async fn fetch_account(&self, url: &str) -> Result<Option<MirrorAccount>, NetworkError> {
        debug!(url, "mirror request");
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(NetworkError::Status(status.as_u16()));
        }

        let account = response
            .json::<MirrorAccount>()
            .await
            .map_err(|e| NetworkError::Decode(e.to_string()))?;
        Ok(Some(account))
    }

    pub async fn resolve_account(&self, address: &str) -> Result<Option<AccountId>, NetworkError> {
        let account = self.fetch_account(&self.account_url(address)).await?;
        Ok(account
            .and_then(|a| a.account)
            .filter(|id| !id.is_empty())
            .map(AccountId::new))
    }

    pub async fn balance(&self, account: &AccountId) -> Result<Balance, NetworkError> {
        let doc = self
            .fetch_account(&self.account_url(account.as_str()))
            .await?
            .ok_or(NetworkError::Status(404))?;
        Ok(balance_from(&doc))
    }

    pub async fn history(
        &self,
        address: &str,
        cursor: Option<&Cursor>,
    ) -> Result<HistoryPage, NetworkError> {
        let url = match cursor {
            Some(Cursor(next)) => format!("{}{}", self.base, next),
            None => self.account_url(address),
        };
        let doc = self
            .fetch_account(&url)
            .await?
            .ok_or(NetworkError::Status(404))?;
        Ok(page_from(doc))
    }
}

pub(crate) fn balance_from(doc: &MirrorAccount) -> Balance {
    Balance {
        native: doc.balance.balance.max(0) as u64,
        tokens: doc
            .balance
            .tokens
            .iter()
            .map(|t| TokenBalance {
                token_id: t.token_id.clone(),
                amount: t.balance.max(0) as u64,
                decimals: 0,
            })
            .collect(),
    }
}

pub(crate) fn page_from(doc: MirrorAccount) -> HistoryPage {
    let owner = doc.account.unwrap_or_default();
    let transactions = doc
        .transactions
        .into_iter()
        .map(|tx| {
            let net_amount = tx
                .transfers
                .iter()
                .filter(|t| t.account == owner)
                .map(|t| t.amount)
                .sum();
            let memo = STANDARD
                .decode(tx.memo_base64.as_bytes())
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                .unwrap_or_default();
            TransactionRecord {
                id: tx.transaction_id,
                consensus_timestamp: tx.consensus_timestamp,
                result: tx.result,
                name: tx.name,
                net_amount,
                memo,
            }
        })
        .collect();

    HistoryPage {
        transactions,
        next: doc.links.next.filter(|n| !n.is_empty()).map(Cursor),
    }
}
