//! recovery phrase -> signing key -> evm style address
//!
//! seed:    bip39 seed, empty passphrase
//! path:    slip-10 ed25519, m/44'/3030'/0'/0'/0'
//! key:     the 32 byte child key read as a secp256k1 scalar
//! address: 0x + last 20 bytes of keccak256(uncompressed pubkey without tag)

use std::fmt;

use hmac::{Hmac, Mac};
use k256::ecdsa::{self, RecoveryId, Signature};
use sha2::Sha512;
use sha3::{Digest, Keccak256};
use zeroize::Zeroizing;

use crate::secret::RecoveryPhrase;
use crate::{Error, Result};

type HmacSha512 = Hmac<Sha512>;

const SLIP10_CURVE: &[u8] = b"ed25519 seed";
const HARDENED: u32 = 0x8000_0000;

/// hedera coin type path, all components hardened
pub const DERIVATION_PATH: [u32; 5] = [44, 3030, 0, 0, 0];

/// secp256k1 signing key; zeroized on drop by k256
#[derive(Clone)]
pub struct SigningKey {
    inner: ecdsa::SigningKey,
}

/// 64 byte r||s plus recovery id
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecoverableSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub recovery_id: u8,
}

impl SigningKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let inner = ecdsa::SigningKey::from_slice(bytes)
            .map_err(|e| Error::KeyDerivation(e.to_string()))?;
        Ok(Self { inner })
    }

    /// 65 byte sec1 uncompressed public key
    pub fn public_key_uncompressed(&self) -> Vec<u8> {
        self.inner
            .verifying_key()
            .to_encoded_point(false)
            .as_bytes()
            .to_vec()
    }

    pub fn address(&self) -> String {
        address_of(self)
    }

    /// sign a 32 byte digest, low-s normalized
    pub fn sign_prehash(&self, digest: &[u8; 32]) -> Result<RecoverableSignature> {
        let (signature, recovery_id): (Signature, RecoveryId) = self
            .inner
            .sign_prehash_recoverable(digest)
            .map_err(|e| Error::KeyDerivation(e.to_string()))?;

        let bytes = signature.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);

        Ok(RecoverableSignature {
            r,
            s,
            recovery_id: recovery_id.to_byte(),
        })
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningKey({})", self.address())
    }
}

/// deterministic phrase -> key
pub fn derive(phrase: &RecoveryPhrase) -> Result<SigningKey> {
    let seed = phrase.to_seed()?;
    let child = slip10_ed25519(&seed[..], &DERIVATION_PATH)?;
    SigningKey::from_bytes(&child[..])
}

/// deterministic key -> `0x` prefixed lowercase hex address
pub fn address_of(key: &SigningKey) -> String {
    let public = key.public_key_uncompressed();
    let hash = keccak256(&public[1..]);
    format!("0x{}", hex::encode(&hash[12..]))
}

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// slip-10 hardened-only derivation for the ed25519 curve
fn slip10_ed25519(seed: &[u8], path: &[u32]) -> Result<Zeroizing<[u8; 32]>> {
    let (mut key, mut chain) = split(hmac_sha512(SLIP10_CURVE, &[seed])?);

    for index in path {
        let hardened = (index | HARDENED).to_be_bytes();
        let (k, c) = split(hmac_sha512(&chain[..], &[&[0u8][..], &key[..], &hardened[..]])?);
        key = k;
        chain = c;
    }

    Ok(key)
}

fn hmac_sha512(key: &[u8], parts: &[&[u8]]) -> Result<Zeroizing<[u8; 64]>> {
    let mut mac =
        HmacSha512::new_from_slice(key).map_err(|e| Error::KeyDerivation(e.to_string()))?;
    for part in parts {
        mac.update(part);
    }
    let mut out = Zeroizing::new([0u8; 64]);
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

fn split(i: Zeroizing<[u8; 64]>) -> (Zeroizing<[u8; 32]>, Zeroizing<[u8; 32]>) {
    let mut left = Zeroizing::new([0u8; 32]);
    let mut right = Zeroizing::new([0u8; 32]);
    left.copy_from_slice(&i[..32]);
    right.copy_from_slice(&i[32..]);
    (left, right)
}
