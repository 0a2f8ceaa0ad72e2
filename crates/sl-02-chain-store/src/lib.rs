//! # SL-02 Chain Store
//!
//! Per-group block ledger over an abstract byte store.
//!
//! **Subsystem ID:** 2
//!
//! ## Purpose
//!
//! - [`ChainStore`]: blocks keyed by hash, a height index, a transaction
//!   index and the tip ("latest") pointer of one group's chain.
//! - [`BlockHeadStore`]: header-only blocks of every group, keyed by
//!   (group, height), the trust anchor for relay proofs.
//!
//! Both are generic over the [`KeyValueStore`] port so the runtime can
//! plug in memory or RocksDB.
//!
//! ## Chain Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | Genesis has zero `prev_hash` | `append` |
//! | `prev_hash` links to the tip | `append` |
//! | Height index agrees with tip | every mutation is one atomic batch |
//!
//! ## Module Structure
//!
//! ```text
//! sl-02-chain-store/
//! ├── domain/          # key layout, errors
//! ├── ports/           # KeyValueStore + InMemoryKVStore
//! ├── chain.rs         # ChainStore
//! └── heads.rs         # BlockHeadStore
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chain;
pub mod domain;
pub mod heads;
pub mod ports;

pub use chain::ChainStore;
pub use domain::{ChainStoreError, KVStoreError};
pub use heads::BlockHeadStore;
pub use ports::{BatchOperation, DynStore, InMemoryKVStore, KeyValueStore};
