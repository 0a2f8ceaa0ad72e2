//! # Domain Errors

use shared_types::{Hash, OutPoint, TxnError};
use sl_02_chain_store::{ChainStoreError, KVStoreError};
use thiserror::Error;

/// UTXO set error types.
#[derive(Debug, Error)]
pub enum UtxoError {
    /// The byte store failed.
    #[error(transparent)]
    Store(#[from] KVStoreError),

    /// Reading the chain failed.
    #[error(transparent)]
    Chain(#[from] ChainStoreError),

    /// A record failed to (de)serialize.
    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// The transaction is invalid on its own terms.
    #[error("invalid transaction: {0}")]
    InvalidTxn(#[from] TxnError),

    /// A block spends an output of this group that is not unspent.
    #[error("block spends unavailable output {}:{}", hex::encode(.0.txn_hash), .0.index)]
    MissingSpentOutput(OutPoint),

    /// Reversing a block found one of its outputs already gone; a later
    /// block that spent it was not reversed first.
    #[error("output {}:{} created by reversed block is missing", hex::encode(.0.txn_hash), .0.index)]
    MissingCreatedOutput(OutPoint),

    /// A coinbase anywhere but first in a block, or more than one.
    #[error("coinbase at position {0}")]
    MisplacedCoinbase(usize),

    /// The same transaction listed twice in one block.
    #[error("transaction {} repeated within the block", hex::encode(.0))]
    RepeatedTxn(Hash),

    /// Coinbases never enter a mempool.
    #[error("coinbase cannot be submitted")]
    CoinbaseNotAllowed,

    /// A pending transaction already spends this output.
    #[error("output {}:{} already claimed by a pending transaction", hex::encode(.0.txn_hash), .0.index)]
    AlreadyClaimed(OutPoint),

    /// The owner cannot cover the amount.
    #[error("insufficient funds: have {available}, need {required}")]
    InsufficientFunds {
        /// Spendable balance.
        available: i64,
        /// Requested amount.
        required: i64,
    },

    /// Transfer amount must be positive.
    #[error("invalid amount {0}")]
    InvalidAmount(i64),
}

impl UtxoError {
    /// Whether this error means stored state is inconsistent.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::MissingCreatedOutput(_) | Self::Chain(ChainStoreError::Corrupt(_))
        )
    }
}
