//! # Node
//!
//! One running peer: its stores, its transport endpoint, its request
//! handler and its drivers.
//!
//! ## Startup Sequence
//!
//! 1. Validate configuration
//! 2. Open stores, build the sync engine and the node service
//! 3. Register the handler with the network
//! 4. Founder: create missing geneses. Others: synchronize every group
//! 5. Spawn the resync driver, and the miner driver when mining is on

use crate::adapters::{open_node_state, LocalNetwork};
use crate::config::NodeConfig;
use crate::drivers::{MinerDriver, ResyncDriver};
use crate::errors::NodeError;
use crate::genesis::GenesisBuilder;
use crate::mining::{payout_owner, Miner, NonceMiner};
use parking_lot::Mutex;
use shared_types::{hash_prefix, GroupId, PeerAddress};
use sl_06_chain_sync::{NodeState, PeerRequestHandler, SyncEngine};
use sl_07_gossip::NodeService;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// How long shutdown waits for each driver.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Tip summary of one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupTip {
    /// Group.
    pub group: GroupId,
    /// Tip height, `None` before genesis.
    pub height: Option<u32>,
    /// Tip hash.
    pub hash: Option<shared_types::Hash>,
}

/// A running Shard-Ledger peer.
pub struct Node {
    config: NodeConfig,
    service: Arc<NodeService>,
    network: Arc<LocalNetwork>,
    miner: Arc<dyn Miner>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Node {
    /// Build the node and join `network`.
    pub fn new(config: NodeConfig, network: Arc<LocalNetwork>) -> Result<Self, NodeError> {
        Self::with_miner(config, network, Arc::new(NonceMiner::default()))
    }

    /// [`Node::new`] with a custom mining capability.
    pub fn with_miner(
        config: NodeConfig,
        network: Arc<LocalNetwork>,
        miner: Arc<dyn Miner>,
    ) -> Result<Self, NodeError> {
        config.validate()?;
        let state = Arc::new(open_node_state(&config)?);
        let served = state.served_groups();

        let address = PeerAddress::new(config.address.clone());
        let transport = Arc::new(network.transport(address.clone()));
        let engine = SyncEngine::new(state, transport, config.sync.clone());
        let service = Arc::new(NodeService::new(address, engine));

        let handler: Arc<dyn PeerRequestHandler> = service.clone();
        network.register(&handler, served);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Ok(Self {
            config,
            service,
            network,
            miner,
            shutdown_tx,
            shutdown_rx,
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Configuration.
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Address.
    pub fn address(&self) -> &PeerAddress {
        self.service.gossip().address()
    }

    /// Request handler and wallet entry point.
    pub fn service(&self) -> &Arc<NodeService> {
        &self.service
    }

    /// Node state.
    pub fn state(&self) -> &Arc<NodeState> {
        self.service.state()
    }

    /// Founder: create the genesis of every served group that has none.
    /// Others: bootstrap and reconcile every served group.
    pub async fn initialize(&self) -> Result<(), NodeError> {
        if self.config.founder {
            return self.found_groups().await;
        }
        for (group, result) in self.service.engine().synchronize_all().await {
            match result {
                Ok(outcome) => info!("[runtime] {} group {} synchronized: {:?}", self.address(), group, outcome),
                Err(err) if err.is_retryable() => {
                    warn!("[runtime] {} group {} not synchronized yet: {}", self.address(), group, err)
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    async fn found_groups(&self) -> Result<(), NodeError> {
        let owners = self
            .config
            .mining
            .owners()
            .map_err(crate::config::ConfigError::from)?;
        let max = self.state().router().max_group_num();

        for group in self.state().served_groups() {
            let context = self.state().group(group)?;
            let mut ledger = context.write().await;
            if ledger.chain.tip()?.is_some() {
                continue;
            }
            let owner = payout_owner(&owners, group, max)
                .ok_or(crate::config::ConfigError::NoMiningAddress)?;
            let genesis = GenesisBuilder::new(owner)
                .reward(self.config.mining.reward)
                .bits(self.config.mining.difficulty_bits)
                .build(group, self.miner.as_ref())?;
            ledger.install_genesis(&genesis, self.config.sync.min_difficulty_bits)?;
            self.state().record_head(&genesis)?;
            info!(
                "[runtime] {} founded group {} with genesis {}",
                self.address(),
                group,
                hash_prefix(&genesis.hash())
            );
        }
        Ok(())
    }

    /// Spawn the drivers.
    pub fn start(&self) -> Result<(), NodeError> {
        let mut tasks = self.tasks.lock();

        let resync = ResyncDriver::new(self.service.engine().clone());
        tasks.push(tokio::spawn(resync.run(self.shutdown_rx.clone())));

        if self.config.mining.enabled {
            let miner = MinerDriver::new(
                Arc::clone(&self.service),
                Arc::clone(&self.miner),
                self.config.mining.clone(),
            )?;
            tasks.push(tokio::spawn(miner.run(self.shutdown_rx.clone())));
        }

        info!("[runtime] {} running {} driver(s)", self.address(), tasks.len());
        Ok(())
    }

    /// Tip of every served group.
    pub async fn tips(&self) -> Result<Vec<GroupTip>, NodeError> {
        let mut tips = Vec::new();
        for group in self.state().served_groups() {
            let context = self.state().group(group)?;
            let ledger = context.read().await;
            let tip = ledger.chain.tip()?;
            tips.push(GroupTip {
                group,
                height: tip.as_ref().map(|block| block.height),
                hash: tip.as_ref().map(|block| block.hash()),
            });
        }
        Ok(tips)
    }

    /// Leave the network and stop the drivers.
    ///
    /// Drivers finish their current round first; one still busy after the
    /// grace period is left to finish on its own.
    pub async fn shutdown(&self) {
        info!("[runtime] {} shutting down", self.address());
        self.network.unregister(self.address());
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }

        let tasks: Vec<JoinHandle<()>> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            if tokio::time::timeout(SHUTDOWN_GRACE, task).await.is_err() {
                warn!("[runtime] {} driver still busy after shutdown signal", self.address());
            }
        }
    }
}
