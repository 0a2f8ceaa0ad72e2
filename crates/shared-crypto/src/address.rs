//! # Wallet Addresses
//!
//! Human-facing encoding of an owner hash:
//!
//! ```text
//! hex( version(1) || pub_key_hash(20) || checksum(4) )
//! checksum = SHA-256(SHA-256(version || pub_key_hash))[..4]
//! ```

use crate::ecdsa::PubKeyHash;
use crate::hashing::sha256;
use crate::CryptoError;

/// Version byte of every address this node produces.
pub const ADDRESS_VERSION: u8 = 0x00;

const CHECKSUM_LEN: usize = 4;
const PAYLOAD_LEN: usize = 1 + 20;

fn checksum(payload: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = sha256(&sha256(payload));
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest[..CHECKSUM_LEN]);
    out
}

/// Encode an owner hash as an address string.
pub fn encode_address(pub_key_hash: &PubKeyHash) -> String {
    let mut payload = Vec::with_capacity(PAYLOAD_LEN + CHECKSUM_LEN);
    payload.push(ADDRESS_VERSION);
    payload.extend_from_slice(pub_key_hash);
    let sum = checksum(&payload);
    payload.extend_from_slice(&sum);
    hex::encode(payload)
}

/// Decode an address back to its owner hash, checking version and checksum.
pub fn address_to_pub_key_hash(address: &str) -> Result<PubKeyHash, CryptoError> {
    let raw = hex::decode(address).map_err(|e| CryptoError::MalformedAddress(e.to_string()))?;
    if raw.len() != PAYLOAD_LEN + CHECKSUM_LEN {
        return Err(CryptoError::MalformedAddress(format!(
            "expected {} bytes, got {}",
            PAYLOAD_LEN + CHECKSUM_LEN,
            raw.len()
        )));
    }

    let (payload, sum) = raw.split_at(PAYLOAD_LEN);
    if checksum(payload) != sum {
        return Err(CryptoError::ChecksumMismatch);
    }
    if payload[0] != ADDRESS_VERSION {
        return Err(CryptoError::UnsupportedVersion(payload[0]));
    }

    let mut pkh = [0u8; 20];
    pkh.copy_from_slice(&payload[1..]);
    Ok(pkh)
}

/// Whether `address` is a well-formed address.
pub fn validate_address(address: &str) -> bool {
    address_to_pub_key_hash(address).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Secp256k1KeyPair;
    use proptest::prelude::*;

    #[test]
    fn test_encode_decode() {
        let keypair = Secp256k1KeyPair::generate();
        let address = encode_address(&keypair.pub_key_hash());

        assert!(validate_address(&address));
        assert_eq!(
            address_to_pub_key_hash(&address).unwrap(),
            keypair.pub_key_hash()
        );
    }

    #[test]
    fn test_rejects_bad_checksum() {
        let mut address = encode_address(&[7u8; 20]);
        // Flip the last hex digit.
        let last = address.pop().unwrap();
        address.push(if last == '0' { '1' } else { '0' });

        assert_eq!(
            address_to_pub_key_hash(&address),
            Err(CryptoError::ChecksumMismatch)
        );
    }

    #[test]
    fn test_rejects_non_hex_and_short() {
        assert!(!validate_address("not an address"));
        assert!(!validate_address("00ff"));
        assert!(!validate_address(""));
    }

    proptest! {
        #[test]
        fn prop_any_owner_hash_survives_encoding(pkh in proptest::array::uniform20(any::<u8>())) {
            let address = encode_address(&pkh);
            prop_assert_eq!(address_to_pub_key_hash(&address).unwrap(), pkh);
        }
    }
}
