//! the ledger seen from the session core

use async_trait::async_trait;
use shred_vault::SigningKey;

use crate::error::{NetworkError, TransferError};
use crate::types::{AccountId, Balance, Cursor, HistoryPage, TransactionId, TransferRequest};

/// network access used by the session; every call is long latency
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// account owning `address`, `None` if the network has never seen it
    async fn resolve_account(&self, address: &str) -> Result<Option<AccountId>, NetworkError>;

    async fn get_balance(&self, account: &AccountId) -> Result<Balance, NetworkError>;

    /// sign and submit; resolves once the network accepted or rejected it
    async fn submit_transfer(
        &self,
        request: TransferRequest,
        key: &SigningKey,
    ) -> Result<TransactionId, TransferError>;

    /// first page when `cursor` is `None`
    async fn get_history_page(
        &self,
        address: &str,
        cursor: Option<&Cursor>,
    ) -> Result<HistoryPage, NetworkError>;
}
