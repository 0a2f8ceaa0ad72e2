//! # Runtime Errors

use crate::config::ConfigError;
use crate::genesis::GenesisError;
use sl_02_chain_store::{ChainStoreError, KVStoreError};
use sl_03_utxo_set::UtxoError;
use sl_05_merkle_relay::RelayError;
use sl_06_chain_sync::SyncError;
use sl_07_gossip::GossipError;
use thiserror::Error;

/// Anything that can stop a node from starting or a driver round from
/// completing.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Invalid configuration.
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    /// A store could not be opened.
    #[error("storage: {0}")]
    Storage(#[from] KVStoreError),

    /// Founder genesis creation failed.
    #[error("genesis: {0}")]
    Genesis(#[from] GenesisError),

    /// Sync engine or group state failure.
    #[error("sync: {0}")]
    Sync(#[from] SyncError),

    /// Gossip admission failure.
    #[error("gossip: {0}")]
    Gossip(#[from] GossipError),

    /// Chain store failure.
    #[error("chain store: {0}")]
    Chain(#[from] ChainStoreError),

    /// UTXO set failure.
    #[error("utxo set: {0}")]
    Utxo(#[from] UtxoError),

    /// Relay proof construction failure.
    #[error("relay: {0}")]
    Relay(#[from] RelayError),

    /// A blocking mining task panicked or was cancelled.
    #[error("mining task failed: {0}")]
    MiningTask(String),
}
