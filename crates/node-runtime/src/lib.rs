//! # Node Runtime Library
//!
//! Wires the Shard-Ledger subsystems into running peers. The devnet entry
//! point is the `main.rs` binary; the workspace `tests` crate drives
//! several [`Node`]s over one [`LocalNetwork`].
//!
//! ## Module Structure
//!
//! ```text
//! node-runtime/
//! ├── adapters/     # LocalNetwork transport, store factory (memory, RocksDB)
//! ├── drivers/      # MinerDriver, ResyncDriver
//! ├── genesis/      # Founder genesis builder
//! ├── config.rs     # NodeConfig + SL_* environment overrides
//! ├── errors.rs     # NodeError
//! ├── mining.rs     # Miner capability, NonceMiner
//! ├── node.rs       # Node: startup, drivers, shutdown
//! └── telemetry.rs  # tracing subscriber
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod config;
pub mod drivers;
pub mod errors;
pub mod genesis;
pub mod mining;
pub mod node;
pub mod telemetry;

pub use adapters::{LocalNetwork, LocalTransport};
pub use config::{load_config, ConfigError, MiningConfig, NodeConfig, StorageBackend, StorageConfig};
pub use errors::NodeError;
pub use mining::{Miner, NonceMiner};
pub use node::{GroupTip, Node};
