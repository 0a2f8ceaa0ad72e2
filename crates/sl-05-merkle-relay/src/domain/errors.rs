//! # Domain Errors

use shared_types::GroupId;
use thiserror::Error;

/// Relay and block verification errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// No transaction at this index.
    #[error("transaction index {index} out of range ({len} transactions)")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of transactions.
        len: usize,
    },

    /// The head belongs to another group.
    #[error("head is for group {actual}, relay claims group {expected}")]
    GroupMismatch {
        /// Group named by the relay.
        expected: GroupId,
        /// Group of the head.
        actual: GroupId,
    },

    /// The head sits at another height.
    #[error("head is at height {actual}, relay claims height {expected}")]
    HeightMismatch {
        /// Height named by the relay.
        expected: u32,
        /// Height of the head.
        actual: u32,
    },

    /// The Merkle path does not lead to the head's root.
    #[error("merkle path does not reach the block root")]
    ProofInvalid,

    /// Genesis with a non-zero parent, or a later block with a zero parent.
    #[error("parent link invalid for height {0}")]
    BadParentLink(u32),

    /// Declared difficulty below the network minimum.
    #[error("difficulty {declared} below minimum {required}")]
    DifficultyTooLow {
        /// Network minimum.
        required: u32,
        /// Declared by the block.
        declared: u32,
    },

    /// The hash does not meet the declared difficulty.
    #[error("hash has {actual} leading zero bits, needs {required}")]
    InsufficientWork {
        /// Declared difficulty.
        required: u32,
        /// Leading zero bits of the hash.
        actual: u32,
    },

    /// A full block whose body is empty or does not open with a coinbase.
    #[error("block body does not start with a coinbase")]
    MissingCoinbase,

    /// The body does not hash to the header's root.
    #[error("merkle root does not match transactions")]
    MerkleRootMismatch,
}
