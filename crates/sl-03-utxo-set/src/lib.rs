//! # SL-03 UTXO Set
//!
//! Unspent outputs of one group, kept in step with that group's chain.
//!
//! **Subsystem ID:** 3
//!
//! ## Purpose
//!
//! - `update(block)` / `reverse(block)`: advance and roll back by one block;
//!   `reverse` is the exact inverse of `update`.
//! - `reindex(chain)`: rebuild from scratch (bootstrap and repair only).
//! - `find_utxo_by_hash`, `balance`: owner queries.
//! - `mem_verify_transaction`: mempool-time affordability and double-spend
//!   check against outputs already claimed by pending transactions.
//! - `new_transfer`: wallet-side transaction construction.
//!
//! ## Group Scope
//!
//! A set only tracks outputs whose owner hash maps to its own group. Inputs
//! and outputs owned elsewhere are skipped by update and reverse alike, so
//! a relayed transaction credits only the destination group and the inverse
//! law holds per group.
//!
//! ## Concurrency
//!
//! The set is not internally synchronized. Callers hold the group's ledger
//! lock across `update`, `reverse` and `reindex`; `reindex` must never
//! interleave with incremental mutation.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod domain;
pub mod transfer;
pub mod utxo_set;

pub use domain::UtxoError;
pub use utxo_set::UtxoSet;
