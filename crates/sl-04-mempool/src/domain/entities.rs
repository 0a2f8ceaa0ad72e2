//! # Mempool Entities

use serde::{Deserialize, Serialize};
use shared_types::{GroupId, Hash, Transaction};

/// Mempool limits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MempoolConfig {
    /// Maximum pending transactions per group.
    pub max_size: usize,
    /// Maximum transactions handed to the miner for one block.
    pub max_block_txns: usize,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        Self {
            max_size: 10_000,
            max_block_txns: 256,
        }
    }
}

impl MempoolConfig {
    /// Small limits for tests.
    pub fn for_testing() -> Self {
        Self {
            max_size: 16,
            max_block_txns: 8,
        }
    }
}

/// How a transaction reached the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    /// Submitted or gossiped within this group.
    Local,
    /// Relayed from another group with a Merkle proof.
    Relayed {
        /// Source group.
        from_group: GroupId,
        /// Height of the source block.
        height: u32,
    },
}

/// A pooled transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingTxn {
    /// Transaction hash.
    pub hash: Hash,
    /// The transaction.
    pub txn: Transaction,
    /// Origin.
    pub kind: EntryKind,
    /// Arrival sequence number; lower arrived first.
    pub sequence: u64,
}
