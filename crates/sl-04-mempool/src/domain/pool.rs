//! # Transaction Pool
//!
//! ## Data Structures
//!
//! - `by_hash`: O(1) lookup by transaction hash
//! - `by_arrival`: arrival order, the order the miner takes them in
//! - `claimed`: output -> pending transaction spending it

use super::entities::{EntryKind, MempoolConfig, PendingTxn};
use super::errors::MempoolError;
use shared_types::{Block, Hash, OutPoint, Transaction};
use std::collections::{BTreeMap, HashMap};

/// Pending transactions of one group.
#[derive(Debug)]
pub struct TransactionPool {
    config: MempoolConfig,
    by_hash: HashMap<Hash, PendingTxn>,
    by_arrival: BTreeMap<u64, Hash>,
    claimed: HashMap<OutPoint, Hash>,
    next_sequence: u64,
}

impl TransactionPool {
    /// Creates a new empty transaction pool.
    pub fn new(config: MempoolConfig) -> Self {
        Self {
            config,
            by_hash: HashMap::new(),
            by_arrival: BTreeMap::new(),
            claimed: HashMap::new(),
            next_sequence: 0,
        }
    }

    /// Creates a pool with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(MempoolConfig::default())
    }

    /// Returns the current configuration.
    pub fn config(&self) -> &MempoolConfig {
        &self.config
    }

    /// Returns the number of transactions in the pool.
    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    /// Returns true if the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }

    /// Gets a transaction by hash.
    pub fn get(&self, hash: &Hash) -> Option<&PendingTxn> {
        self.by_hash.get(hash)
    }

    /// Checks if a transaction exists in the pool.
    pub fn contains(&self, hash: &Hash) -> bool {
        self.by_hash.contains_key(hash)
    }

    /// Whether a pending transaction spends `outpoint`.
    pub fn is_claimed(&self, outpoint: &OutPoint) -> bool {
        self.claimed.contains_key(outpoint)
    }

    /// Adds a transaction to the pool.
    ///
    /// # Errors
    /// - `CoinbaseRejected` for a coinbase
    /// - `DuplicateTransaction` if hash already exists
    /// - `DoubleSpend` if a local transaction spends a claimed output
    /// - `PoolFull` if at capacity
    pub fn add(&mut self, txn: Transaction, kind: EntryKind) -> Result<Hash, MempoolError> {
        if txn.is_coinbase() {
            return Err(MempoolError::CoinbaseRejected);
        }

        let hash = txn.hash();
        if self.by_hash.contains_key(&hash) {
            return Err(MempoolError::DuplicateTransaction(hash));
        }

        let claims: Vec<OutPoint> = match kind {
            EntryKind::Local => txn.spent_outpoints().collect(),
            EntryKind::Relayed { .. } => Vec::new(),
        };
        for outpoint in &claims {
            if let Some(existing) = self.claimed.get(outpoint) {
                return Err(MempoolError::DoubleSpend {
                    outpoint: *outpoint,
                    existing: *existing,
                });
            }
        }

        if self.by_hash.len() >= self.config.max_size {
            return Err(MempoolError::PoolFull {
                capacity: self.config.max_size,
            });
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        for outpoint in claims {
            self.claimed.insert(outpoint, hash);
        }
        self.by_arrival.insert(sequence, hash);
        self.by_hash.insert(
            hash,
            PendingTxn {
                hash,
                txn,
                kind,
                sequence,
            },
        );
        Ok(hash)
    }

    /// Removes a transaction by hash.
    pub fn remove(&mut self, hash: &Hash) -> Option<PendingTxn> {
        let entry = self.by_hash.remove(hash)?;
        self.by_arrival.remove(&entry.sequence);
        for outpoint in entry.txn.spent_outpoints() {
            if self.claimed.get(&outpoint) == Some(hash) {
                self.claimed.remove(&outpoint);
            }
        }
        Some(entry)
    }

    /// Drop every transaction `block` includes, plus pending transactions
    /// that spend an output the block spent. Returns how many were dropped.
    pub fn remove_included(&mut self, block: &Block) -> usize {
        let mut dropped = 0;
        for txn in &block.txns {
            if self.remove(&txn.hash()).is_some() {
                dropped += 1;
            }
            for outpoint in txn.spent_outpoints() {
                if let Some(conflict) = self.claimed.get(&outpoint).copied() {
                    if self.remove(&conflict).is_some() {
                        dropped += 1;
                    }
                }
            }
        }
        dropped
    }

    /// Up to `max_block_txns` transactions in arrival order.
    pub fn select_for_block(&self) -> Vec<Transaction> {
        self.by_arrival
            .values()
            .filter_map(|hash| self.by_hash.get(hash))
            .take(self.config.max_block_txns)
            .map(|entry| entry.txn.clone())
            .collect()
    }

    /// Removes everything.
    pub fn clear(&mut self) {
        self.by_hash.clear();
        self.by_arrival.clear();
        self.claimed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{TxnInput, TxnOutput};

    fn spending(seed: u8, index: u32, to: u8) -> Transaction {
        Transaction {
            vin: vec![TxnInput::spending(OutPoint::new([seed; 32], index), 10)],
            vout: vec![TxnOutput::new(10, [to; 20])],
        }
    }

    #[test]
    fn test_add_and_lookup() {
        let mut pool = TransactionPool::with_defaults();
        let txn = spending(1, 0, 2);
        let hash = pool.add(txn.clone(), EntryKind::Local).unwrap();

        assert_eq!(hash, txn.hash());
        assert!(pool.contains(&hash));
        assert!(pool.is_claimed(&OutPoint::new([1; 32], 0)));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut pool = TransactionPool::with_defaults();
        pool.add(spending(1, 0, 2), EntryKind::Local).unwrap();
        assert!(matches!(
            pool.add(spending(1, 0, 2), EntryKind::Local),
            Err(MempoolError::DuplicateTransaction(_))
        ));
    }

    #[test]
    fn test_double_spend_rejected() {
        let mut pool = TransactionPool::with_defaults();
        let first = pool.add(spending(1, 0, 2), EntryKind::Local).unwrap();

        let err = pool.add(spending(1, 0, 3), EntryKind::Local).unwrap_err();
        assert_eq!(
            err,
            MempoolError::DoubleSpend {
                outpoint: OutPoint::new([1; 32], 0),
                existing: first,
            }
        );
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_relayed_entries_claim_nothing() {
        let mut pool = TransactionPool::with_defaults();
        let kind = EntryKind::Relayed {
            from_group: 1,
            height: 4,
        };
        pool.add(spending(1, 0, 2), kind).unwrap();
        assert!(!pool.is_claimed(&OutPoint::new([1; 32], 0)));
        assert_eq!(pool.get(&spending(1, 0, 2).hash()).unwrap().kind, kind);
    }

    #[test]
    fn test_coinbase_and_capacity() {
        let mut pool = TransactionPool::new(MempoolConfig {
            max_size: 1,
            max_block_txns: 1,
        });
        assert_eq!(
            pool.add(Transaction::coinbase([1; 20], 10, 0, 0), EntryKind::Local),
            Err(MempoolError::CoinbaseRejected)
        );
        pool.add(spending(1, 0, 2), EntryKind::Local).unwrap();
        assert_eq!(
            pool.add(spending(2, 0, 2), EntryKind::Local),
            Err(MempoolError::PoolFull { capacity: 1 })
        );
    }

    #[test]
    fn test_select_in_arrival_order() {
        let mut pool = TransactionPool::new(MempoolConfig::for_testing());
        let txns: Vec<_> = (0..10).map(|i| spending(i, 0, 1)).collect();
        for txn in &txns {
            pool.add(txn.clone(), EntryKind::Local).unwrap();
        }
        pool.remove(&txns[0].hash());

        let selected = pool.select_for_block();
        assert_eq!(selected.len(), 8);
        assert_eq!(selected[0], txns[1]);
        assert_eq!(selected[7], txns[8]);
    }

    #[test]
    fn test_remove_included_drops_conflicts() {
        let mut pool = TransactionPool::with_defaults();
        let mined = spending(1, 0, 2);
        let conflicting = spending(1, 1, 3);
        let unrelated = spending(5, 0, 3);
        pool.add(conflicting.clone(), EntryKind::Local).unwrap();
        pool.add(unrelated.clone(), EntryKind::Local).unwrap();

        // Mined transaction spends the output the pooled one claims.
        let mut rival = mined.clone();
        rival.vin.push(TxnInput::spending(OutPoint::new([1; 32], 1), 10));
        let block = Block {
            txns: vec![rival],
            ..Block::default()
        };

        assert_eq!(pool.remove_included(&block), 1);
        assert!(!pool.contains(&conflicting.hash()));
        assert!(pool.contains(&unrelated.hash()));
        assert!(!pool.is_claimed(&OutPoint::new([1; 32], 1)));
    }
}
