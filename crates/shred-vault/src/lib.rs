//! # shred-vault
//!
//! custody layer for the shred wallet: everything that touches the recovery
//! phrase lives here, nothing here touches the network.
//!
//! ```text
//!  password ──argon2id──▶ key ──chacha20poly1305──▶ wallet-<addr>.dat
//!                                                        │
//!                          RecoveryPhrase ◀── open ──────┘
//!                                │
//!                      slip-10 m/44'/3030'/0'/0'/0'
//!                                ▼
//!                     SigningKey (secp256k1) ──keccak──▶ 0x address
//! ```
//!
//! secrets are held in zeroize-on-drop containers ([`SecretBytes`],
//! [`RecoveryPhrase`], k256's signing key) and never formatted into logs or
//! error messages.

pub mod error;
pub mod keys;
pub mod registry;
pub mod secret;
pub mod vault;

pub use error::{Error, Result};
pub use keys::{address_of, derive, RecoverableSignature, SigningKey};
pub use registry::{WalletMetadata, WalletRegistry, WalletSummary};
pub use secret::{RecoveryPhrase, SecretBytes};
pub use vault::{EncryptedWallet, KdfParams, SecureVault};
