//! # Domain Errors

use shared_types::{hash_prefix, Hash};
use thiserror::Error;

/// Byte-store failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KVStoreError {
    /// I/O error during read/write.
    #[error("KV store I/O error: {message}")]
    IOError {
        /// Backend message.
        message: String,
    },

    /// Data corruption in the store.
    #[error("KV store corruption: {message}")]
    CorruptionError {
        /// Backend message.
        message: String,
    },
}

/// Chain store error types.
#[derive(Debug, Error)]
pub enum ChainStoreError {
    /// The byte store failed.
    #[error(transparent)]
    Store(#[from] KVStoreError),

    /// A record failed to (de)serialize.
    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// The block does not extend the current tip.
    #[error("block at height {height} does not chain onto tip (expected height {expected_height})")]
    DoesNotChain {
        /// Height of the rejected block.
        height: u32,
        /// Height the next block must have.
        expected_height: u32,
    },

    /// A genesis block was appended to a non-empty chain, or a non-genesis
    /// block to an empty one.
    #[error("bad genesis placement at height {0}")]
    BadGenesis(u32),

    /// No block with this hash.
    #[error("unknown block {}", hash_prefix(.0))]
    UnknownBlock(Hash),

    /// The operation needs a non-empty chain.
    #[error("chain is empty")]
    Empty,

    /// Only blocks detached from the active chain can be removed this way.
    #[error("block {} is on the active chain", hash_prefix(.0))]
    InActiveChain(Hash),

    /// Stored records disagree with each other.
    #[error("chain store corrupt: {0}")]
    Corrupt(String),
}
