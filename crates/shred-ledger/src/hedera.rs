//! LedgerGateway over a hedera mirror node and json-rpc relay

use async_trait::async_trait;
use shred_vault::SigningKey;
use tracing::{info, warn};

use crate::amount::parse_amount;
use crate::error::{NetworkError, TransferError};
use crate::evm::{erc20_transfer_data, LegacyTransaction, WEIBARS_PER_TINYBAR};
use crate::gateway::LedgerGateway;
use crate::mirror::MirrorClient;
use crate::network::Network;
use crate::relay::RelayClient;
use crate::types::{
    AccountId, Asset, Balance, Cursor, HistoryPage, TransactionId, TransferRequest,
};

const NATIVE_GAS_LIMIT: u64 = 400_000;
const TOKEN_GAS_LIMIT: u64 = 800_000;

pub struct HederaGateway {
    network: Network,
    mirror: MirrorClient,
    relay: RelayClient,
}

impl HederaGateway {
    pub fn new(network: Network, mirror_url: &str, relay_url: &str) -> Result<Self, NetworkError> {
        Ok(Self {
            network,
            mirror: MirrorClient::new(mirror_url)?,
            relay: RelayClient::new(relay_url)?,
        })
    }

    /// default public endpoints for `network`
    pub fn for_network(network: Network) -> Result<Self, NetworkError> {
        Self::new(network, network.mirror_url(), network.relay_url())
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// the transaction without nonce and gas price filled in
    pub fn build_transaction(&self, request: &TransferRequest) -> Result<LegacyTransaction, TransferError> {
        if request.sender.parts().is_none() {
            return Err(TransferError::InvalidAccount(request.sender.to_string()));
        }
        let recipient = request.recipient.long_zero_address()?;
        let units = parse_amount(&request.amount, request.asset.decimals())?;

        let (to, value, data, gas_limit) = match &request.asset {
            Asset::Native => (
                recipient,
                units as u128 * WEIBARS_PER_TINYBAR,
                Vec::new(),
                NATIVE_GAS_LIMIT,
            ),
            Asset::Token { id, .. } => {
                let token = AccountId::new(id.clone())
                    .long_zero_address()
                    .map_err(|_| TransferError::InvalidAccount(format!("token {}", id)))?;
                (
                    token,
                    0,
                    erc20_transfer_data(&recipient, units as u128),
                    TOKEN_GAS_LIMIT,
                )
            }
        };

        Ok(LegacyTransaction {
            nonce: 0,
            gas_price: 0,
            gas_limit,
            to,
            value,
            data,
            chain_id: self.network.chain_id(),
        })
    }
}

#[async_trait]
impl LedgerGateway for HederaGateway {
    async fn resolve_account(&self, address: &str) -> Result<Option<AccountId>, NetworkError> {
        self.mirror.resolve_account(address).await
    }

    async fn get_balance(&self, account: &AccountId) -> Result<Balance, NetworkError> {
        self.mirror.balance(account).await
    }

    /// the memo has no place in an evm transaction and is not sent
    async fn submit_transfer(
        &self,
        request: TransferRequest,
        key: &SigningKey,
    ) -> Result<TransactionId, TransferError> {
        let mut tx = self.build_transaction(&request)?;

        let from = key.address();
        tx.nonce = self.relay.nonce(&from).await?;
        tx.gas_price = self.relay.gas_price().await?;

        let raw = tx.sign(key)?;
        let hash = self.relay.send_raw(&raw).await.map_err(|e| match e {
            NetworkError::Rpc { message, .. } => TransferError::Rejected(message),
            other => TransferError::Network(other),
        })?;
        info!(hash = %hash, recipient = %request.recipient, "transfer submitted");

        match self.relay.wait_for_receipt(&hash).await? {
            Some(receipt) if receipt.succeeded() => Ok(TransactionId(hash)),
            Some(_) => Err(TransferError::Rejected(format!("transaction {} reverted", hash))),
            None => {
                warn!(hash = %hash, "no receipt yet, reporting as submitted");
                Ok(TransactionId(hash))
            }
        }
    }

    async fn get_history_page(
        &self,
        address: &str,
        cursor: Option<&Cursor>,
    ) -> Result<HistoryPage, NetworkError> {
        self.mirror.history(address, cursor).await
    }
}
