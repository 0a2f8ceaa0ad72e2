//! # SL-04 Mempool
//!
//! Pending transactions of one group, waiting to be mined.
//!
//! **Subsystem ID:** 4
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | No duplicate transaction hashes | `TransactionPool::add` |
//! | No two pending transactions spend one output | claimed-output index in `add` |
//! | Mined transactions leave the pool | `TransactionPool::remove_included` |
//!
//! Relayed transactions spend outputs of their source group, so they never
//! claim outputs here.
//!
//! Signature and UTXO checks belong to the caller (gossip handlers); the
//! pool only enforces uniqueness.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod domain;

pub use domain::{EntryKind, MempoolConfig, MempoolError, PendingTxn, TransactionPool};
