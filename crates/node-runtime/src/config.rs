//! # Node Configuration
//!
//! Unified configuration for all subsystems and runtime parameters.
//!
//! Every subsystem owns its own section (`GroupConfig`, `MempoolConfig`,
//! `SyncConfig`); the runtime adds mining, storage and devnet settings and
//! applies `SL_*` environment overrides on top of the defaults.

use serde::{Deserialize, Serialize};
use shared_crypto::{address_to_pub_key_hash, CryptoError, PubKeyHash};
use sl_01_group_router::{GroupConfig, GroupConfigError};
use sl_04_mempool::MempoolConfig;
use sl_06_chain_sync::SyncConfig;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Block reward paid by every coinbase.
pub const DEFAULT_REWARD: i64 = 10;

/// Complete node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Address this node is reachable at.
    pub address: String,
    /// Whether this node creates the genesis of every group it serves.
    pub founder: bool,
    /// Served group window.
    pub groups: GroupConfig,
    /// Mempool limits.
    pub mempool: MempoolConfig,
    /// Sync engine settings.
    pub sync: SyncConfig,
    /// Block production.
    pub mining: MiningConfig,
    /// Storage backend.
    pub storage: StorageConfig,
    /// Number of in-process nodes the devnet binary starts.
    pub devnet_nodes: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            address: "node".to_string(),
            founder: false,
            groups: GroupConfig::default(),
            mempool: MempoolConfig::default(),
            sync: SyncConfig::default(),
            mining: MiningConfig::default(),
            storage: StorageConfig::default(),
            devnet_nodes: 3,
        }
    }
}

impl NodeConfig {
    /// Fast single-node configuration serving every group.
    pub fn for_testing(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            founder: false,
            groups: GroupConfig::for_testing(),
            mempool: MempoolConfig::for_testing(),
            sync: SyncConfig::for_testing(),
            mining: MiningConfig::for_testing(),
            storage: StorageConfig::default(),
            devnet_nodes: 1,
        }
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address.is_empty() {
            return Err(ConfigError::EmptyAddress);
        }
        self.groups.validate()?;

        if self.mining.enabled || self.founder {
            if self.mining.mining_addresses.is_empty() {
                return Err(ConfigError::NoMiningAddress);
            }
            self.mining.owners()?;
        }
        if self.mining.difficulty_bits < self.sync.min_difficulty_bits {
            return Err(ConfigError::DifficultyBelowMinimum {
                bits: self.mining.difficulty_bits,
                min: self.sync.min_difficulty_bits,
            });
        }
        if self.devnet_nodes == 0 {
            return Err(ConfigError::NoDevnetNodes);
        }
        if !self.storage.backend.is_available() {
            return Err(ConfigError::RocksDbDisabled);
        }
        Ok(())
    }

    /// One configuration per devnet node: node 0 founds every group and
    /// serves them all; followers serve `groups.group_num` groups starting
    /// at successive base groups.
    pub fn devnet(&self) -> Vec<NodeConfig> {
        let max = self.groups.max_group_num;
        (0..self.devnet_nodes)
            .map(|index| {
                let mut node = self.clone();
                node.address = format!("{}-{}", self.address, index);
                node.devnet_nodes = 1;
                if index == 0 {
                    node.founder = true;
                    node.groups.base_group = 0;
                    node.groups.group_num = max;
                } else {
                    node.founder = false;
                    node.groups.base_group = (self.groups.base_group + index as u32 - 1) % max;
                }
                node
            })
            .collect()
    }
}

/// Invalid configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The node address is empty.
    #[error("node address must not be empty")]
    EmptyAddress,

    /// The group window is malformed.
    #[error(transparent)]
    Groups(#[from] GroupConfigError),

    /// Mining or founding needs somewhere to pay rewards.
    #[error("mining requires at least one mining address")]
    NoMiningAddress,

    /// A mining address does not decode.
    #[error("bad mining address: {0}")]
    BadMiningAddress(#[from] CryptoError),

    /// Mined blocks would be rejected by every peer.
    #[error("difficulty {bits} is below the network minimum {min}")]
    DifficultyBelowMinimum {
        /// Configured mining difficulty.
        bits: u32,
        /// Network minimum.
        min: u32,
    },

    /// The devnet needs at least one node.
    #[error("devnet needs at least one node")]
    NoDevnetNodes,

    /// RocksDB storage requested in a build without the `rocksdb` feature.
    #[error("rocksdb storage requested but the rocksdb feature is disabled")]
    RocksDbDisabled,
}

/// Mining/Block Production configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiningConfig {
    /// Enable mining (block production).
    pub enabled: bool,
    /// Encoded addresses coinbases pay to; each group pays the first
    /// address it owns.
    pub mining_addresses: Vec<String>,
    /// Coinbase reward.
    pub reward: i64,
    /// Leading zero bits mined blocks carry.
    pub difficulty_bits: u32,
    /// Pause between mining rounds in milliseconds.
    pub interval_ms: u64,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mining_addresses: Vec::new(),
            reward: DEFAULT_REWARD,
            difficulty_bits: 12,
            interval_ms: 2_000,
        }
    }
}

impl MiningConfig {
    /// Trivial difficulty, short interval.
    pub fn for_testing() -> Self {
        Self {
            enabled: false,
            mining_addresses: Vec::new(),
            reward: DEFAULT_REWARD,
            difficulty_bits: 0,
            interval_ms: 50,
        }
    }

    /// Pause between rounds.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Decoded owner hashes of `mining_addresses`.
    pub fn owners(&self) -> Result<Vec<PubKeyHash>, CryptoError> {
        self.mining_addresses
            .iter()
            .map(|address| address_to_pub_key_hash(address))
            .collect()
    }
}

/// Which byte store backs the chain, UTXO and head tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageBackend {
    /// Volatile, for tests and throwaway devnets.
    Memory,
    /// RocksDB under `data_dir` (requires the `rocksdb` feature).
    RocksDb,
}

impl StorageBackend {
    /// Whether this build can open the backend.
    pub fn is_available(self) -> bool {
        match self {
            StorageBackend::Memory => true,
            StorageBackend::RocksDb => cfg!(feature = "rocksdb"),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend.
    pub backend: StorageBackend,
    /// Root directory; each node opens `<data_dir>/<address>`.
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            data_dir: PathBuf::from("./data"),
        }
    }
}

/// Load configuration from the environment.
pub fn load_config() -> NodeConfig {
    let mut config = NodeConfig::default();
    apply_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

/// Apply `SL_*` overrides read through `lookup`. Unparsable values are
/// logged and ignored.
pub fn apply_overrides(config: &mut NodeConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(address) = lookup("SL_ADDRESS") {
        config.address = address;
    }
    override_parsed(&lookup, "SL_BASE_GROUP", &mut config.groups.base_group);
    override_parsed(&lookup, "SL_GROUP_NUM", &mut config.groups.group_num);
    override_parsed(&lookup, "SL_MAX_GROUP_NUM", &mut config.groups.max_group_num);
    override_parsed(&lookup, "SL_DIFFICULTY_BITS", &mut config.mining.difficulty_bits);
    override_parsed(&lookup, "SL_DEVNET_NODES", &mut config.devnet_nodes);

    if let Some(addresses) = lookup("SL_MINING_ADDRESS") {
        config.mining.mining_addresses = addresses
            .split(',')
            .map(str::trim)
            .filter(|address| !address.is_empty())
            .map(str::to_string)
            .collect();
        config.mining.enabled = !config.mining.mining_addresses.is_empty();
        info!(
            "Mining to {} address(es) from environment",
            config.mining.mining_addresses.len()
        );
    }

    if let Some(storage) = lookup("SL_STORAGE") {
        if storage.eq_ignore_ascii_case("memory") {
            config.storage.backend = StorageBackend::Memory;
        } else {
            config.storage.backend = StorageBackend::RocksDb;
            config.storage.data_dir = PathBuf::from(storage);
        }
    }
}

fn override_parsed<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    target: &mut T,
) {
    if let Some(raw) = lookup(key) {
        match raw.parse() {
            Ok(value) => *target = value,
            Err(_) => warn!("{} has an invalid value {:?}, ignored", key, raw),
        }
    }
}
