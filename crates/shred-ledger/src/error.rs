//! error types for shred-ledger

use thiserror::Error;

/// read-side failures: the gateway could not answer
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NetworkError {
    #[error("network unreachable: {0}")]
    Unreachable(String),

    #[error("mirror node returned status: {0}")]
    Status(u16),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("relay error {code}: {message}")]
    Rpc { code: i64, message: String },
}

impl From<reqwest::Error> for NetworkError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            NetworkError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            NetworkError::Status(status.as_u16())
        } else {
            NetworkError::Unreachable(e.to_string())
        }
    }
}

/// write-side failures for a transfer
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransferError {
    #[error("invalid account id: {0}")]
    InvalidAccount(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("transaction rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Network(#[from] NetworkError),
}
