//! error types for shred-vault

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// wrong password and corrupted file are deliberately the same error
    #[error("invalid passphrase or corrupted wallet file")]
    AuthFailure,

    #[error("invalid recovery phrase")]
    InvalidPhrase,

    #[error("storage error: {0}")]
    Storage(String),

    #[error("secure randomness unavailable: {0}")]
    Randomness(String),

    #[error("kdf failed: {0}")]
    Kdf(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),
}

impl Error {
    pub(crate) fn storage(context: &str, err: impl std::fmt::Display) -> Self {
        Error::Storage(format!("{}: {}", context, err))
    }
}
