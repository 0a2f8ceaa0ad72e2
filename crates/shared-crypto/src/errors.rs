//! Crypto error types.

use thiserror::Error;

/// Cryptographic and wallet-encoding errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Signature verification failed
    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    /// Invalid public key
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Invalid private key
    #[error("Invalid private key")]
    InvalidPrivateKey,

    /// Invalid signature
    #[error("Invalid signature")]
    InvalidSignature,

    /// Address is not valid hex or has the wrong length.
    #[error("Malformed address: {0}")]
    MalformedAddress(String),

    /// Address checksum does not match its payload.
    #[error("Address checksum mismatch")]
    ChecksumMismatch,

    /// Unknown address version byte.
    #[error("Unsupported address version: {0}")]
    UnsupportedVersion(u8),
}
