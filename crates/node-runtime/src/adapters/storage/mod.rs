//! # Storage Adapters
//!
//! Opens the byte stores of one node: a chain table and a UTXO table per
//! served group, plus the head table shared by all groups.
//!
//! - [`StorageBackend::Memory`]: `InMemoryKVStore` from sl-02.
//! - [`StorageBackend::RocksDb`]: one RocksDB database per node under
//!   `<data_dir>/<address>`, one column family per table. Needs the
//!   `rocksdb` feature:
//!
//! ```toml
//! node-runtime = { path = "...", features = ["rocksdb"] }
//! ```

#[cfg(feature = "rocksdb")]
pub mod rocksdb_adapter;

#[cfg(feature = "rocksdb")]
pub use rocksdb_adapter::{RocksDbConfig, RocksDbDatabase, RocksDbStore};

use crate::config::{NodeConfig, StorageBackend};
use crate::errors::NodeError;
use sl_01_group_router::GroupRouter;
use sl_06_chain_sync::{NodeState, StoreScope};

/// Every table a node with `router` opens.
pub fn store_scopes(router: &GroupRouter) -> Vec<StoreScope> {
    let mut scopes: Vec<StoreScope> = router
        .served_groups()
        .into_iter()
        .flat_map(|group| [StoreScope::Chain(group), StoreScope::Utxo(group)])
        .collect();
    scopes.push(StoreScope::Heads);
    scopes
}

/// Open the state of the node described by `config`.
pub fn open_node_state(config: &NodeConfig) -> Result<NodeState, NodeError> {
    let router = GroupRouter::new(config.groups.clone());
    match config.storage.backend {
        StorageBackend::Memory => Ok(NodeState::in_memory(router, config.mempool.clone())),
        StorageBackend::RocksDb => open_rocksdb(router, config),
    }
}

#[cfg(feature = "rocksdb")]
fn open_rocksdb(router: GroupRouter, config: &NodeConfig) -> Result<NodeState, NodeError> {
    use sl_02_chain_store::DynStore;

    let path = config.storage.data_dir.join(&config.address);
    let database = RocksDbDatabase::open(&RocksDbConfig::at(path), &store_scopes(&router))?;
    let state = NodeState::open(router, config.mempool.clone(), |scope| {
        database
            .store(scope)
            .map(|store| Box::new(store) as DynStore)
    })?;
    Ok(state)
}

#[cfg(not(feature = "rocksdb"))]
fn open_rocksdb(_router: GroupRouter, _config: &NodeConfig) -> Result<NodeState, NodeError> {
    Err(crate::config::ConfigError::RocksDbDisabled.into())
}
