//! secret containers that overwrite their bytes on drop

use std::fmt;

use bip39::{Language, Mnemonic};
use rand::{rngs::OsRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::{Error, Result};

/// 256 bits of entropy -> 24 words
const ENTROPY_LEN: usize = 32;

pub const PHRASE_WORDS: usize = 24;

/// owned secret buffer, zeroized on every drop path
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretBytes(Vec<u8>);

impl SecretBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn expose(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBytes({} bytes)", self.0.len())
    }
}

/// BIP-39 recovery phrase held as zeroizing utf-8 bytes
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct RecoveryPhrase {
    bytes: SecretBytes,
}

impl RecoveryPhrase {
    /// generate a fresh 24 word phrase from the os rng
    pub fn generate() -> Result<Self> {
        let mut entropy = Zeroizing::new([0u8; ENTROPY_LEN]);
        OsRng
            .try_fill_bytes(&mut entropy[..])
            .map_err(|e| Error::Randomness(e.to_string()))?;

        let mnemonic =
            Mnemonic::from_entropy(&entropy[..]).map_err(|e| Error::Randomness(e.to_string()))?;

        Ok(Self {
            bytes: SecretBytes::new(mnemonic.to_string().into_bytes()),
        })
    }

    /// validate decrypted vault contents as a phrase
    pub fn from_secret(bytes: SecretBytes) -> Result<Self> {
        let text = std::str::from_utf8(bytes.expose()).map_err(|_| Error::InvalidPhrase)?;
        Mnemonic::parse_in(Language::English, text).map_err(|_| Error::InvalidPhrase)?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.expose()
    }

    pub fn as_str(&self) -> &str {
        // contents were validated as utf-8 on construction
        std::str::from_utf8(self.bytes.expose()).unwrap_or_default()
    }

    pub fn words(&self) -> Vec<&str> {
        self.as_str().split_whitespace().collect()
    }

    /// zero-based word lookup
    pub fn word(&self, index: usize) -> Option<&str> {
        self.as_str().split_whitespace().nth(index)
    }

    /// 64 byte BIP-39 seed with an empty passphrase
    pub(crate) fn to_seed(&self) -> Result<Zeroizing<[u8; 64]>> {
        let mnemonic =
            Mnemonic::parse_in(Language::English, self.as_str()).map_err(|_| Error::InvalidPhrase)?;
        Ok(Zeroizing::new(mnemonic.to_seed("")))
    }
}

impl fmt::Debug for RecoveryPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RecoveryPhrase(***)")
    }
}
