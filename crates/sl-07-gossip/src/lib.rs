//! # SL-07 Gossip
//!
//! Inbound gossip handling and request dispatch for one node.
//!
//! **Subsystem ID:** 7
//!
//! ## Message Kinds
//!
//! | Kind | Scope | Admitted when |
//! |------|-------|---------------|
//! | `Txn` | within group | not pooled, not mined, inputs unspent and unclaimed |
//! | `RelayTxn` | destination group | source head known, Merkle path verifies |
//! | `Block` | within group | extends the tip; otherwise reverse-gossip or reconcile |
//! | `BlockHead` | all groups | self-verifies, no head at that height yet |
//!
//! Every handler validates, applies if new, then re-gossips in the
//! background excluding the sender. Presence checks (mempool, chain, head
//! store) are the only de-duplication, so redelivery is a no-op.
//!
//! Each kind has its own admission lock; none of them is the group's chain
//! lock.
//!
//! ## Module Structure
//!
//! ```text
//! sl-07-gossip/
//! ├── domain/       # GossipOutcome, GossipError
//! ├── gossip.rs     # GossipService (the four handlers)
//! └── service.rs    # NodeService (PeerRequestHandler, balance, transfer)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod domain;
pub mod gossip;
pub mod service;

pub use domain::{GossipError, GossipOutcome};
pub use gossip::GossipService;
pub use service::NodeService;
