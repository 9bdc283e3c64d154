//! # shred-ledger
//!
//! network side of the shred wallet. the session core only sees the
//! [`LedgerGateway`] trait; [`HederaGateway`] is the production
//! implementation:
//!
//! - reads (account resolution, balances, history) from a mirror node
//! - transfers as signed eip-155 transactions through a json-rpc relay

pub mod amount;
pub mod error;
pub mod evm;
pub mod gateway;
pub mod hedera;
pub mod mirror;
pub mod network;
pub mod relay;
pub mod types;

pub use amount::{format_native, format_units, parse_amount, NATIVE_DECIMALS};
pub use error::{NetworkError, TransferError};
pub use gateway::LedgerGateway;
pub use hedera::HederaGateway;
pub use network::Network;
pub use types::{
    AccountId, Asset, Balance, Cursor, HistoryPage, TokenBalance, TransactionId,
    TransactionRecord, TransferRequest,
};
