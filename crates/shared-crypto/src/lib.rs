//! # Shared Crypto
//!
//! Cryptographic primitives consumed by every Shard-Ledger subsystem.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA-256 | Block identity, txn identity, Merkle leaves, group routing |
//! | `ecdsa` | secp256k1 | Transaction input signatures |
//! | `address` | hex + 4-byte checksum | Wallet address validation / owner-hash extraction |
//!
//! The same digest function is used for signing, block identity and Merkle
//! leaves; nothing else in the workspace hashes on its own.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod address;
pub mod ecdsa;
pub mod errors;
pub mod hashing;

// Re-exports
pub use address::{address_to_pub_key_hash, encode_address, validate_address, ADDRESS_VERSION};
pub use ecdsa::{owner_hash, verify_signature, Secp256k1KeyPair, PubKeyHash};
pub use errors::CryptoError;
pub use hashing::{sha256, sha256_many, Sha256Hasher, Digest32};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
