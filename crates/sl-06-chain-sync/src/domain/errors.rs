//! # Sync Errors

use shared_types::{hash_prefix, GroupId, Hash, TransportError};
use sl_02_chain_store::ChainStoreError;
use sl_03_utxo_set::UtxoError;
use sl_05_merkle_relay::RelayError;
use thiserror::Error;

/// Errors raised while bootstrapping, handshaking or reconciling.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Peer call failed.
    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    /// Chain store failure.
    #[error("chain store: {0}")]
    Chain(#[from] ChainStoreError),

    /// UTXO set failure.
    #[error("utxo set: {0}")]
    Utxo(#[from] UtxoError),

    /// Block failed self-verification.
    #[error("block verification: {0}")]
    Relay(#[from] RelayError),

    /// This node does not serve the group.
    #[error("group {0} is not served by this node")]
    GroupNotServed(GroupId),

    /// A block was handed to the wrong group.
    #[error("block of group {actual} offered to group {expected}")]
    WrongGroup {
        /// Group being updated.
        expected: GroupId,
        /// Group the block declares.
        actual: GroupId,
    },

    /// A genesis was expected but the block sits at a later height.
    #[error("block at height {0} is not a genesis")]
    NotGenesis(u32),

    /// The block includes a transaction the active chain already holds.
    #[error("transaction {} is already on the chain", hash_prefix(.0))]
    AlreadyIncluded(Hash),

    /// The group has no genesis yet.
    #[error("group {0} has no genesis")]
    NoGenesis(GroupId),

    /// Every bootstrap attempt failed.
    #[error("bootstrap of group {group} failed after {attempts} attempts")]
    BootstrapExhausted {
        /// Group being bootstrapped.
        group: GroupId,
        /// Attempts made.
        attempts: u32,
    },

    /// Every handshake attempt failed.
    #[error("handshake for group {group} failed after {attempts} attempts")]
    HandshakeExhausted {
        /// Group being synchronized.
        group: GroupId,
        /// Attempts made.
        attempts: u32,
    },

    /// The peer returned no blocks for the requested range.
    #[error("peer returned an empty range from height {0}")]
    EmptyRange(u32),

    /// The fetched range does not chain onto the agreed anchor.
    #[error("fetched range does not chain onto height {0}")]
    AnchorMismatch(u32),
}

impl SyncError {
    /// Whether the caller may retry later with a chance of success.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(err) => err.is_retryable(),
            Self::BootstrapExhausted { .. }
            | Self::HandshakeExhausted { .. }
            | Self::EmptyRange(_)
            | Self::AnchorMismatch(_) => true,
            _ => false,
        }
    }

    /// Whether the error means the offered block is unacceptable, as
    /// opposed to local state failing.
    pub fn is_rejection(&self) -> bool {
        match self {
            Self::Relay(_)
            | Self::WrongGroup { .. }
            | Self::NotGenesis(_)
            | Self::AlreadyIncluded(_) => true,
            Self::Chain(err) => matches!(
                err,
                ChainStoreError::DoesNotChain { .. } | ChainStoreError::BadGenesis(_)
            ),
            Self::Utxo(err) => matches!(
                err,
                UtxoError::InvalidTxn(_)
                    | UtxoError::MissingSpentOutput(_)
                    | UtxoError::MisplacedCoinbase(_)
                    | UtxoError::RepeatedTxn(_)
                    | UtxoError::CoinbaseNotAllowed
                    | UtxoError::AlreadyClaimed(_)
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(SyncError::Transport(TransportError::Unreachable("n2".into())).is_retryable());
        assert!(SyncError::AnchorMismatch(4).is_retryable());
        assert!(!SyncError::GroupNotServed(3).is_retryable());
        assert!(!SyncError::Utxo(UtxoError::InvalidAmount(0)).is_retryable());
    }

    #[test]
    fn test_rejection_vs_local_failure() {
        assert!(SyncError::Utxo(UtxoError::MisplacedCoinbase(2)).is_rejection());
        assert!(SyncError::Chain(ChainStoreError::BadGenesis(0)).is_rejection());
        assert!(SyncError::AlreadyIncluded([4u8; 32]).is_rejection());
        assert!(SyncError::Utxo(UtxoError::RepeatedTxn([4u8; 32])).is_rejection());
        assert!(!SyncError::Chain(ChainStoreError::Empty).is_rejection());
        assert!(!SyncError::GroupNotServed(1).is_rejection());
    }
}
