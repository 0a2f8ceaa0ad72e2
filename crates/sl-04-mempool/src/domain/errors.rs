//! # Mempool Errors

use shared_types::{hash_prefix, Hash, OutPoint};
use thiserror::Error;

/// Mempool error type.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MempoolError {
    /// Transaction already exists in the pool.
    #[error("transaction {} already pooled", hash_prefix(.0))]
    DuplicateTransaction(Hash),

    /// Another pending transaction already spends this output.
    #[error("output {}:{} already spent by pending {}", hex::encode(.outpoint.txn_hash), .outpoint.index, hash_prefix(.existing))]
    DoubleSpend {
        /// Contested output.
        outpoint: OutPoint,
        /// Pending transaction holding it.
        existing: Hash,
    },

    /// Pool has reached maximum capacity.
    #[error("mempool full ({capacity} transactions)")]
    PoolFull {
        /// Configured capacity.
        capacity: usize,
    },

    /// Coinbases are created by the miner, never pooled.
    #[error("coinbase transactions cannot be pooled")]
    CoinbaseRejected,
}
