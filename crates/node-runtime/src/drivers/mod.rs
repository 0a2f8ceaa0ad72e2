//! # Background Drivers
//!
//! Long-running tasks a node spawns next to its request handlers:
//!
//! - [`MinerDriver`]: builds, mines and announces blocks for every served
//!   group.
//! - [`ResyncDriver`]: periodically re-runs handshake + reconciliation.
//!
//! Both stop when the node's shutdown signal flips.

pub mod miner;
pub mod resync;

pub use miner::MinerDriver;
pub use resync::ResyncDriver;
