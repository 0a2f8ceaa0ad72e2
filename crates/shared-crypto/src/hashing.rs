//! # SHA-256 Hashing
//!
//! The single digest of the ledger. Block identity, transaction identity,
//! signature pre-images, Merkle nodes and group routing all go through here.

use sha2::{Digest, Sha256};

/// SHA-256 output (256-bit).
pub type Digest32 = [u8; 32];

/// Stateful SHA-256 hasher.
#[derive(Default, Clone)]
pub struct Sha256Hasher {
    inner: Sha256,
}

impl Sha256Hasher {
    /// Create new hasher.
    pub fn new() -> Self {
        Self {
            inner: Sha256::new(),
        }
    }

    /// Update with data.
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update(data);
        self
    }

    /// Finalize and return hash.
    pub fn finalize(self) -> Digest32 {
        self.inner.finalize().into()
    }
}

/// Hash data with SHA-256 (one-shot).
pub fn sha256(data: &[u8]) -> Digest32 {
    Sha256::digest(data).into()
}

/// Hash the concatenation of several inputs.
pub fn sha256_many(inputs: &[&[u8]]) -> Digest32 {
    let mut hasher = Sha256Hasher::new();
    for input in inputs {
        hasher.update(input);
    }
    hasher.finalize()
}
