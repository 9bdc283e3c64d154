//! password sealed wallet files: Argon2id + ChaCha20Poly1305
//!
//! file format (json, hex fields):
//! ```text
//! { "salt": <16 bytes>, "nonce": <12 bytes>, "ciphertext": <ct + 16 byte tag> }
//! ```

use std::fs;
use std::io::Write;
use std::path::Path;

use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use crate::secret::SecretBytes;
use crate::{Error, Result};

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// argon2id cost, a few hundred ms on a laptop
const ARGON2_M_COST: u32 = 64 * 1024; // 64 MiB
const ARGON2_T_COST: u32 = 3;
const ARGON2_P_COST: u32 = 4;

/// memory-hard kdf cost parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KdfParams {
    /// memory in KiB
    pub m_cost: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

impl KdfParams {
    pub const DEFAULT: KdfParams = KdfParams {
        m_cost: ARGON2_M_COST,
        t_cost: ARGON2_T_COST,
        p_cost: ARGON2_P_COST,
    };

    /// minimum legal argon2 cost, for tests only
    pub const INSECURE_FAST: KdfParams = KdfParams {
        m_cost: 8,
        t_cost: 1,
        p_cost: 1,
    };
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// persisted vault record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedWallet {
    #[serde(with = "hex_bytes")]
    pub salt: Vec<u8>,
    #[serde(with = "hex_bytes")]
    pub nonce: Vec<u8>,
    #[serde(with = "hex_bytes")]
    pub ciphertext: Vec<u8>,
}

impl EncryptedWallet {
    /// write via a temp file in the same directory, then rename into place
    pub fn write_atomic(&self, path: &Path) -> Result<()> {
        let dir = path
            .parent()
            .ok_or_else(|| Error::Storage(format!("no parent directory for {}", path.display())))?;
        crate::registry::ensure_private_dir(dir)?;

        let json = serde_json::to_vec(self).map_err(|e| Error::storage("encode wallet", e))?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| Error::storage("create temp file", e))?;
        tmp.write_all(&json)
            .map_err(|e| Error::storage("write temp file", e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| Error::storage("sync temp file", e))?;
        set_owner_only(tmp.path())?;
        tmp.persist(path)
            .map_err(|e| Error::storage("persist wallet file", e.error))?;

        debug!(path = %path.display(), "wallet file written");
        Ok(())
    }

    /// read a wallet file; a file that is not a vault record counts as corrupted
    pub fn read(path: &Path) -> Result<Self> {
        let data = fs::read(path).map_err(|e| Error::storage("read wallet file", e))?;
        serde_json::from_slice(&data).map_err(|_| Error::AuthFailure)
    }
}

/// seals and opens secrets under a password
#[derive(Clone, Debug, Default)]
pub struct SecureVault {
    params: KdfParams,
}

impl SecureVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: KdfParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> KdfParams {
        self.params
    }

    /// derive the symmetric key for `password` and `salt`
    pub fn derive_key(&self, password: &str, salt: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>> {
        let params = Params::new(
            self.params.m_cost,
            self.params.t_cost,
            self.params.p_cost,
            Some(KEY_LEN),
        )
        .map_err(|e| Error::Kdf(e.to_string()))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        argon2
            .hash_password_into(password.as_bytes(), salt, &mut key[..])
            .map_err(|e| Error::Kdf(e.to_string()))?;
        Ok(key)
    }

    /// encrypt `secret` with a fresh salt and nonce
    pub fn seal(&self, secret: &[u8], password: &str) -> Result<EncryptedWallet> {
        let mut salt = vec![0u8; SALT_LEN];
        let mut nonce = vec![0u8; NONCE_LEN];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|e| Error::Randomness(e.to_string()))?;
        OsRng
            .try_fill_bytes(&mut nonce)
            .map_err(|e| Error::Randomness(e.to_string()))?;

        let key = self.derive_key(password, &salt)?;
        let cipher = ChaCha20Poly1305::new_from_slice(&key[..])
            .map_err(|e| Error::Encryption(e.to_string()))?;
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), secret)
            .map_err(|e| Error::Encryption(e.to_string()))?;

        Ok(EncryptedWallet {
            salt,
            nonce,
            ciphertext,
        })
    }

    /// decrypt; every failure collapses into `AuthFailure`
    pub fn open(&self, wallet: &EncryptedWallet, password: &str) -> Result<SecretBytes> {
        if wallet.salt.len() != SALT_LEN || wallet.nonce.len() != NONCE_LEN {
            return Err(Error::AuthFailure);
        }

        let key = self
            .derive_key(password, &wallet.salt)
            .map_err(|_| Error::AuthFailure)?;
        let cipher = ChaCha20Poly1305::new_from_slice(&key[..]).map_err(|_| Error::AuthFailure)?;
        let plaintext = cipher
            .decrypt(Nonce::from_slice(&wallet.nonce), wallet.ciphertext.as_slice())
            .map_err(|_| Error::AuthFailure)?;

        Ok(SecretBytes::new(plaintext))
    }

    pub fn seal_to_file(&self, secret: &[u8], password: &str, path: &Path) -> Result<()> {
        self.seal(secret, password)?.write_atomic(path)
    }

    pub fn open_file(&self, path: &Path, password: &str) -> Result<SecretBytes> {
        let wallet = EncryptedWallet::read(path)?;
        self.open(&wallet, password)
    }
}

#[cfg(unix)]
fn set_owner_only(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .map_err(|e| Error::storage("set wallet permissions", e))
}

#[cfg(not(unix))]
fn set_owner_only(_path: &Path) -> Result<()> {
    Ok(())
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn vault() -> SecureVault {
        SecureVault::with_params(KdfParams::INSECURE_FAST)
    }

    #[test]
    fn test_seal_open() {
        let v = vault();
        let sealed = v.seal(b"sensitive wallet data", "hunter2").unwrap();
        let opened = v.open(&sealed, "hunter2").unwrap();
        assert_eq!(opened.expose(), b"sensitive wallet data");
    }

    #[test]
    fn test_wrong_password_is_auth_failure() {
        let v = vault();
        let sealed = v.seal(b"secret", "correct").unwrap();
        assert!(matches!(v.open(&sealed, "incorrect"), Err(Error::AuthFailure)));
    }

    #[test]
    fn test_corruption_is_auth_failure() {
        let v = vault();
        let mut sealed = v.seal(b"secret", "pw").unwrap();
        let last = sealed.ciphertext.len() - 1;
        sealed.ciphertext[last] ^= 0x01;
        assert!(matches!(v.open(&sealed, "pw"), Err(Error::AuthFailure)));

        let mut short_nonce = v.seal(b"secret", "pw").unwrap();
        short_nonce.nonce.truncate(4);
        assert!(matches!(v.open(&short_nonce, "pw"), Err(Error::AuthFailure)));
    }

    #[test]
    fn test_fresh_salt_and_nonce() {
        let v = vault();
        let a = v.seal(b"same", "pw").unwrap();
        let b = v.seal(b"same", "pw").unwrap();
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
        assert_eq!(a.salt.len(), SALT_LEN);
        assert_eq!(a.nonce.len(), NONCE_LEN);
    }

    #[test]
    fn test_derive_key_deterministic() {
        let v = vault();
        let salt = [7u8; SALT_LEN];
        assert_eq!(
            *v.derive_key("pw", &salt).unwrap(),
            *v.derive_key("pw", &salt).unwrap()
        );
        assert_ne!(
            *v.derive_key("pw", &salt).unwrap(),
            *v.derive_key("pw2", &salt).unwrap()
        );
    }

    #[test]
    fn test_file_roundtrip_leaves_no_temp() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wallets").join("wallet-abc.dat");
        let v = vault();

        v.seal_to_file(b"phrase bytes", "pw", &path).unwrap();
        assert!(path.exists());
        assert_eq!(v.open_file(&path, "pw").unwrap().expose(), b"phrase bytes");

        let entries: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_garbage_file_is_auth_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wallet-x.dat");
        fs::write(&path, b"{ not json").unwrap();
        assert!(matches!(vault().open_file(&path, "pw"), Err(Error::AuthFailure)));
    }

    #[test]
    fn test_missing_file_is_storage_error() {
        let dir = tempdir().unwrap();
        let result = vault().open_file(&dir.path().join("nope.dat"), "pw");
        assert!(matches!(result, Err(Error::Storage(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_wallet_file_mode() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        let path = dir.path().join("wallet-m.dat");
        vault().seal_to_file(b"x", "pw", &path).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
