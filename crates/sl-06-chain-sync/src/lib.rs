//! # SL-06 Chain Sync
//!
//! Keeps each served group's chain in step with the network.
//!
//! **Subsystem ID:** 6
//!
//! ## Purpose
//!
//! - **Bootstrap**: fetch genesis from any peer of the group, retrying with
//!   a fixed delay, then rebuild the UTXO set.
//! - **Handshake**: exchange `(height, genesis, tip)` with a peer.
//! - **Reconcile**: binary-search the highest height where local and peer
//!   agree, detach everything above it, fetch the peer's range anchored
//!   there, roll back and replay.
//! - **Serve**: answer `GetGenesis`, `GetHash`, `GetBlocks` and `Version`.
//!
//! ## States
//!
//! ```text
//! NO_GENESIS ──bootstrap──→ BOOTSTRAPPED ──handshake──→ SYNCHRONIZED
//!                                                  ↑          │
//!                                                  └─reconcile┘ (peer ahead)
//! ```
//!
//! ## Locking
//!
//! Each group owns one async `RwLock` over its chain + UTXO pair. Block
//! append, reconciliation and reindex hold it exclusively, so no reader ever
//! sees a tip and a UTXO set that disagree. Reconciliation only runs when
//! the peer is strictly higher, so two nodes never wait on each other.
//!
//! ## Module Structure
//!
//! ```text
//! sl-06-chain-sync/
//! ├── algorithms/      # DivergenceSearch (pure binary search)
//! ├── domain/          # GroupContext, NodeState, SyncError
//! ├── ports/           # PeerTransport (out), PeerRequestHandler (in)
//! ├── config.rs        # SyncConfig
//! └── engine.rs        # SyncEngine
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithms;
pub mod config;
pub mod domain;
pub mod engine;
pub mod ports;

pub use algorithms::{find_divergence, DivergenceSearch};
pub use config::SyncConfig;
pub use domain::{GroupContext, GroupLedger, NodeState, ReconcileOutcome, StoreScope, SyncError};
pub use engine::SyncEngine;
pub use ports::{
    expect_response, MockPeerTransport, PeerRequestHandler, PeerTransport, SentGossip,
};
