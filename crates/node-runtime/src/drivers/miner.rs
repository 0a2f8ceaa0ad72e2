//! # Miner Driver
//!
//! One round per served group:
//!
//! 1. Assemble a candidate on the current tip: coinbase first, then mempool
//!    transactions in arrival order, skipping any that no longer apply.
//! 2. Solve it with the [`Miner`] on a blocking thread.
//! 3. Submit it through the node's own block-gossip path, exactly as if a
//!    peer had sent it (the group re-gossip happens there).
//! 4. Announce the head to every peer and send relay proofs for outputs
//!    owned by other groups.

use crate::config::MiningConfig;
use crate::errors::NodeError;
use crate::mining::{payout_owner, unix_now, Miner};
use shared_crypto::PubKeyHash;
use shared_types::{Block, GossipMessage, GroupId, Transaction, ZERO_HASH};
use sl_05_merkle_relay::{commit_body, cross_group_relays};
use sl_07_gossip::{GossipOutcome, NodeService};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Block production loop of one node.
pub struct MinerDriver {
    service: Arc<NodeService>,
    miner: Arc<dyn Miner>,
    config: MiningConfig,
    owners: Vec<PubKeyHash>,
}

impl MinerDriver {
    /// Driver paying the configured mining addresses.
    pub fn new(
        service: Arc<NodeService>,
        miner: Arc<dyn Miner>,
        config: MiningConfig,
    ) -> Result<Self, NodeError> {
        let owners = config
            .owners()
            .map_err(crate::config::ConfigError::from)?;
        if owners.is_empty() {
            return Err(crate::config::ConfigError::NoMiningAddress.into());
        }
        Ok(Self {
            service,
            miner,
            config,
            owners,
        })
    }

    fn max_group_num(&self) -> u32 {
        self.service.state().router().max_group_num()
    }

    /// Candidate block on top of `group`'s tip, or `None` before genesis.
    pub async fn candidate(&self, group: GroupId) -> Result<Option<Block>, NodeError> {
        let context = self.service.state().group(group)?;
        let ledger = context.read().await;
        let Some(tip) = ledger.chain.tip()? else {
            return Ok(None);
        };
        let Some(owner) = payout_owner(&self.owners, group, self.max_group_num()) else {
            return Ok(None);
        };

        let height = tip.height + 1;
        let mut body = Block {
            group,
            height,
            txns: vec![Transaction::coinbase(owner, self.config.reward, group, height)],
            ..Block::default()
        };
        let pending = context.mempool().select_for_block();
        for txn in pending {
            if ledger.chain.contains_txn(&txn.hash())? {
                continue;
            }
            body.txns.push(txn);
            match ledger.utxo.verify_block(&body) {
                Ok(()) => {}
                Err(err) if err.is_invariant_violation() => return Err(err.into()),
                Err(err) => {
                    debug!("[runtime] group {}: leaving out pending txn: {}", group, err);
                    body.txns.pop();
                }
            }
        }

        Ok(Some(commit_body(Block {
            prev_hash: tip.hash(),
            merkle_root: ZERO_HASH,
            timestamp: unix_now().max(tip.timestamp),
            bits: self.config.difficulty_bits,
            nonce: 0,
            ..body
        })))
    }

    /// Mine and submit one block for `group`. `None` when there is no tip
    /// yet or the miner gave up.
    pub async fn mine_once(&self, group: GroupId) -> Result<Option<GossipOutcome>, NodeError> {
        let Some(candidate) = self.candidate(group).await? else {
            return Ok(None);
        };
        let miner = Arc::clone(&self.miner);
        let mined = tokio::task::spawn_blocking(move || miner.mine(candidate))
            .await
            .map_err(|err| NodeError::MiningTask(err.to_string()))?;
        let Some(block) = mined else {
            return Ok(None);
        };

        let gossip = self.service.gossip();
        let outcome = gossip.handle_block(gossip.address(), block.clone()).await?;
        if !outcome.is_accepted() {
            debug!(
                "[runtime] group {}: own block at height {} not appended: {:?}",
                group, block.height, outcome
            );
            return Ok(Some(outcome));
        }
        info!(
            "[runtime] group {} mined height {} with {} txns",
            group,
            block.height,
            block.txns.len()
        );
        self.announce(&block).await?;
        Ok(Some(outcome))
    }

    async fn announce(&self, block: &Block) -> Result<(), NodeError> {
        let transport = self.service.engine().transport();
        transport
            .broadcast_all(GossipMessage::BlockHead(block.head()), None)
            .await;

        let gossip = self.service.gossip();
        for relay in cross_group_relays(block, self.max_group_num())? {
            let to_group = relay.to_group;
            if self.service.state().router().serves(to_group) {
                // Admits locally and re-gossips to the group's peers.
                let outcome = gossip.handle_relay(gossip.address(), relay).await?;
                debug!("[runtime] relay into own group {}: {:?}", to_group, outcome);
            } else {
                transport
                    .broadcast_group(to_group, GossipMessage::RelayTxn(relay), None)
                    .await;
            }
        }
        Ok(())
    }

    /// Run until `shutdown` flips.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.interval());
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }
            for group in self.service.state().served_groups() {
                if let Err(err) = self.mine_once(group).await {
                    warn!("[runtime] group {}: mining round failed: {}", group, err);
                }
            }
        }
        info!("[runtime] miner driver stopped");
    }
}
