//! eip-155 legacy transactions for the json-rpc relay

use shred_vault::keys::keccak256;
use shred_vault::SigningKey;

use crate::error::TransferError;

/// `transfer(address,uint256)`
const ERC20_TRANSFER: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];

/// 1 tinybar = 10^10 weibars on the relay
pub const WEIBARS_PER_TINYBAR: u128 = 10_000_000_000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub to: [u8; 20],
    pub value: u128,
    pub data: Vec<u8>,
    pub chain_id: u64,
}

impl LegacyTransaction {
    fn fields(&self) -> Vec<Vec<u8>> {
        vec![
            rlp::uint(self.nonce as u128),
            rlp::uint(self.gas_price),
            rlp::uint(self.gas_limit as u128),
            rlp::bytes(&self.to),
            rlp::uint(self.value),
            rlp::bytes(&self.data),
        ]
    }

    /// keccak of rlp([.., chain_id, 0, 0])
    pub fn signing_hash(&self) -> [u8; 32] {
        let mut items = self.fields();
        items.push(rlp::uint(self.chain_id as u128));
        items.push(rlp::uint(0));
        items.push(rlp::uint(0));
        keccak256(&rlp::list(&items))
    }

    /// raw signed transaction bytes
    pub fn sign(&self, key: &SigningKey) -> Result<Vec<u8>, TransferError> {
        let sig = key
            .sign_prehash(&self.signing_hash())
            .map_err(|e| TransferError::Signing(e.to_string()))?;

        let v = self.chain_id as u128 * 2 + 35 + sig.recovery_id as u128;
        let mut items = self.fields();
        items.push(rlp::uint(v));
        items.push(rlp::bytes(trim_leading_zeros(&sig.r)));
        items.push(rlp::bytes(trim_leading_zeros(&sig.s)));
        Ok(rlp::list(&items))
    }
}

/// calldata for an erc-20 facade transfer
pub fn erc20_transfer_data(to: &[u8; 20], amount: u128) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + 64);
    data.extend_from_slice(&ERC20_TRANSFER);
    data.extend_from_slice(&[0u8; 12]);
    data.extend_from_slice(to);
    data.extend_from_slice(&[0u8; 16]);
    data.extend_from_slice(&amount.to_be_bytes());
    data
}

fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

/// minimal recursive length prefix encoder
pub(crate) mod rlp {
    use super::trim_leading_zeros;

    pub fn bytes(data: &[u8]) -> Vec<u8> {
        if data.len() == 1 && data[0] < 0x80 {
            return data.to_vec();
        }
        let mut out = header(0x80, data.len());
        out.extend_from_slice(data);
        out
    }

    pub fn uint(value: u128) -> Vec<u8> {
        let be = value.to_be_bytes();
        bytes(trim_leading_zeros(&be))
    }

    pub fn list(items: &[Vec<u8>]) -> Vec<u8> {
        let payload: Vec<u8> = items.concat();
        let mut out = header(0xc0, payload.len());
        out.extend_from_slice(&payload);
        out
    }

    fn header(offset: u8, len: usize) -> Vec<u8> {
        if len <= 55 {
            return vec![offset + len as u8];
        }
        let be = (len as u64).to_be_bytes();
        let len_bytes = trim_leading_zeros(&be);
        let mut out = vec![offset + 55 + len_bytes.len() as u8];
        out.extend_from_slice(len_bytes);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recover::recover_address;

    #[test]
    fn test_rlp_vectors() {
        assert_eq!(rlp::bytes(b"dog"), vec![0x83, b'd', b'o', b'g']);
        assert_eq!(rlp::bytes(b""), vec![0x80]);
        assert_eq!(rlp::bytes(&[0x0f]), vec![0x0f]);
        assert_eq!(rlp::bytes(&[0x80]), vec![0x81, 0x80]);
        assert_eq!(rlp::uint(0), vec![0x80]);
        assert_eq!(rlp::uint(15), vec![0x0f]);
        assert_eq!(rlp::uint(1024), vec![0x82, 0x04, 0x00]);
        assert_eq!(
            rlp::list(&[rlp::bytes(b"cat"), rlp::bytes(b"dog")]),
            vec![0xc8, 0x83, b'c', b'a', b't', 0x83, b'd', b'o', b'g']
        );
        assert_eq!(rlp::list(&[]), vec![0xc0]);
    }

    #[test]
    fn test_rlp_long_string() {
        let lorem = b"Lorem ipsum dolor sit amet, consectetur adipisicing elit";
        let encoded = rlp::bytes(lorem);
        assert_eq!(&encoded[..2], &[0xb8, 0x38]);
        assert_eq!(&encoded[2..], lorem);
    }

    #[test]
    fn test_erc20_calldata_layout() {
        let to = [0x11u8; 20];
        let data = erc20_transfer_data(&to, 1000);
        assert_eq!(data.len(), 68);
        assert_eq!(&data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(&data[16..36], &to);
        assert_eq!(&data[66..], &[0x03, 0xe8]);
        assert!(data[36..66].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_signed_transaction_recovers_sender() {
        let mut secret = [0u8; 32];
        secret[31] = 1;
        let key = SigningKey::from_bytes(&secret).unwrap();

        let tx = LegacyTransaction {
            nonce: 3,
            gas_price: 710_000_000_000,
            gas_limit: 21_000,
            to: [0x22; 20],
            value: 5 * WEIBARS_PER_TINYBAR,
            data: Vec::new(),
            chain_id: 296,
        };
        let raw = tx.sign(&key).unwrap();
        assert!(raw[0] >= 0xf7, "signed tx is a long list");
        assert_eq!(recover_address(&tx, &raw), key.address());
    }

    /// decode just enough of the signed list to recover the signer
    mod recover {
        use super::super::LegacyTransaction;
        use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
        use shred_vault::keys::keccak256;

        fn item(buf: &[u8]) -> (&[u8], &[u8]) {
            let prefix = buf[0];
            if prefix < 0x80 {
                (&buf[..1], &buf[1..])
            } else if prefix <= 0xb7 {
                let len = (prefix - 0x80) as usize;
                (&buf[1..1 + len], &buf[1 + len..])
            } else {
                let ll = (prefix - 0xb7) as usize;
                let len = buf[1..1 + ll]
                    .iter()
                    .fold(0usize, |acc, b| (acc << 8) | *b as usize);
                (&buf[1 + ll..1 + ll + len], &buf[1 + ll + len..])
            }
        }

        pub fn recover_address(tx: &LegacyTransaction, raw: &[u8]) -> String {
            let ll = (raw[0] - 0xf7) as usize;
            let mut rest = &raw[1 + ll..];
            let mut fields = Vec::new();
            while !rest.is_empty() {
                let (value, tail) = item(rest);
                fields.push(value.to_vec());
                rest = tail;
            }
            assert_eq!(fields.len(), 9);

            let v = fields[6].iter().fold(0u64, |acc, b| (acc << 8) | *b as u64);
            let recovery = (v - tx.chain_id * 2 - 35) as u8;
            let mut rs = [0u8; 64];
            rs[32 - fields[7].len()..32].copy_from_slice(&fields[7]);
            rs[64 - fields[8].len()..].copy_from_slice(&fields[8]);

            let key = VerifyingKey::recover_from_prehash(
                &tx.signing_hash(),
                &Signature::from_slice(&rs).unwrap(),
                RecoveryId::from_byte(recovery).unwrap(),
            )
            .unwrap();
            let point = key.to_encoded_point(false);
            let hash = keccak256(&point.as_bytes()[1..]);
            format!("0x{}", hex::encode(&hash[12..]))
        }
    }
}
