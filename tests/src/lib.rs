//! # Shard-Ledger Test Suite
//!
//! Multi-node scenarios: every node is a full [`node_runtime::Node`] and
//! all of them talk over one in-process [`node_runtime::LocalNetwork`].
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs            # Keys, node setup, block forging, snapshots
//! └── scenarios/
//!     ├── fork_resolution.rs # Gap detection, rollback, replay, reverse gossip
//!     ├── convergence.rs     # Divergence point for every shared prefix
//!     ├── double_spend.rs    # Conflicting transfers across two mempools
//!     ├── relay.rs           # Cross-group relay waiting on its head
//!     ├── idempotence.rs     # Repeated block, txn and head gossip
//!     └── devnet.rs          # Mining founder with followers
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p sl-tests
//! cargo test -p sl-tests scenarios::fork_resolution
//! ```

#[cfg(test)]
mod fixtures;
pub mod scenarios;
