//! # ECDSA Signatures (secp256k1)
//!
//! Wallet keys for spending transaction outputs.
//!
//! - RFC 6979 deterministic nonces (no RNG dependency for signing)
//! - Public keys travel SEC1-compressed (33 bytes) inside transaction inputs
//! - Signatures travel as 64-byte `r || s`
//!
//! An output is locked to the *owner hash* of a public key; spending it
//! requires presenting the public key and a signature by the matching secret.

use crate::hashing::sha256;
use crate::CryptoError;
use k256::ecdsa::{
    signature::{Signer, Verifier},
    Signature, SigningKey, VerifyingKey,
};
use zeroize::Zeroize;

/// Owner hash: the first 20 bytes of SHA-256 over a compressed public key.
pub type PubKeyHash = [u8; 20];

/// Derive the owner hash of a SEC1 public key.
pub fn owner_hash(pub_key: &[u8]) -> PubKeyHash {
    let digest = sha256(pub_key);
    let mut out = [0u8; 20];
    out.copy_from_slice(&digest[..20]);
    out
}

/// Verify a 64-byte signature over `message` by a SEC1-encoded public key.
///
/// Malformed keys and signatures verify as `false`; this never panics.
pub fn verify_signature(pub_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_sec1_bytes(pub_key) else {
        return false;
    };
    let Ok(sig) = Signature::from_slice(signature) else {
        return false;
    };
    verifying_key.verify(message, &sig).is_ok()
}

/// secp256k1 wallet keypair.
pub struct Secp256k1KeyPair {
    signing_key: SigningKey,
}

impl Secp256k1KeyPair {
    /// Generate random keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        Self { signing_key }
    }

    /// Create from secret key bytes (32 bytes).
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_bytes((&bytes).into()).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self { signing_key })
    }

    /// Compressed SEC1 public key (33 bytes).
    pub fn public_key(&self) -> Vec<u8> {
        self.signing_key.verifying_key().to_sec1_bytes().to_vec()
    }

    /// Owner hash of this keypair's public key.
    pub fn pub_key_hash(&self) -> PubKeyHash {
        owner_hash(&self.public_key())
    }

    /// Sign a message, returning `r || s`.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let sig: Signature = self.signing_key.sign(message);
        sig.to_bytes().to_vec()
    }

    /// Secret key bytes (for wallet persistence).
    pub fn to_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes().into()
    }
}

impl Drop for Secp256k1KeyPair {
    fn drop(&mut self) {
        let mut bytes: [u8; 32] = self.signing_key.to_bytes().into();
        bytes.zeroize();
    }
}

impl std::fmt::Debug for Secp256k1KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secp256k1KeyPair")
            .field("pub_key_hash", &hex::encode(self.pub_key_hash()))
            .finish()
    }
}
