//! # Adapter Implementations
//!
//! Concrete implementations of the subsystems' outbound ports:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  OUTER LAYER (Adapters)                      │
//! │   LocalTransport, InMemoryKVStore / RocksDbStore, NonceMiner │
//! │                        ↑ implements ↑                        │
//! │                  MIDDLE LAYER (Ports)                        │
//! │   PeerTransport (sl-06), KeyValueStore (sl-02), Miner        │
//! │                          ↑ uses ↑                            │
//! │                  INNER LAYER (Domain)                        │
//! │   chain store, UTXO set, mempool, sync engine, gossip        │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod network;
pub mod storage;

pub use network::{LocalNetwork, LocalTransport};
pub use storage::{open_node_state, store_scopes};
